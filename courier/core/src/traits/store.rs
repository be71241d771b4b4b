use crate::locks::IriGuard;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("resource not found: {0}")]
	NotFound(String),

	#[error("storage backend failure: {0}")]
	Internal(String),
}

/// Persistence as consumed by the engine. Implementations must make every operation
/// atomic on its own; multi-step read-modify-write sequences are serialized by the
/// engine through `lock`.
///
/// The engine never holds a returned guard across an outgoing http call: mutations
/// commit and release before any delivery is launched.
#[async_trait::async_trait]
pub trait Database : Send + Sync {
	/// advisory lock on one IRI, released when the guard drops
	async fn lock(&self, iri: &str) -> Result<IriGuard, StorageError>;

	/// whether this server keeps the resource named by this IRI, local or a
	/// cached remote copy it is responsible for serving
	async fn owns(&self, iri: &str) -> Result<bool, StorageError>;

	async fn exists(&self, iri: &str) -> Result<bool, StorageError>;

	async fn get(&self, iri: &str) -> Result<serde_json::Value, StorageError>;

	/// store a new value under its own id
	async fn create(&self, value: serde_json::Value) -> Result<(), StorageError>;

	/// replace the value stored under this value's id
	async fn update(&self, value: serde_json::Value) -> Result<(), StorageError>;

	async fn delete(&self, iri: &str) -> Result<(), StorageError>;

	/// whether the inbox collection already lists this activity id
	async fn inbox_contains(&self, inbox: &str, id: &str) -> Result<bool, StorageError>;

	async fn inbox_for_actor(&self, actor: &str) -> Result<String, StorageError>;

	async fn outbox_for_inbox(&self, inbox: &str) -> Result<String, StorageError>;

	async fn actor_for_inbox(&self, inbox: &str) -> Result<String, StorageError>;

	async fn actor_for_outbox(&self, outbox: &str) -> Result<String, StorageError>;

	/// mint a fresh id for a value about to enter the outbox
	async fn new_id(&self, value: &serde_json::Value) -> Result<String, StorageError>;
}

pub trait Clock : Send + Sync {
	fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

/// wall clock, the default outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> chrono::DateTime<chrono::Utc> {
		chrono::Utc::now()
	}
}
