#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
	#[error("request is not authenticated")]
	Unauthorized,

	#[error("actor is not allowed to perform this request")]
	Forbidden,

	#[error("application hook failed: {0}")]
	Hook(String),
}

/// what to do when a remote actor asks to follow a local one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowPolicy {
	AutoAccept,
	AutoReject,
	#[default]
	Manual,
}

#[derive(Debug, Clone)]
pub struct KeyMaterial {
	pub key_id: String,
	pub private_key_pem: String,
}

/// Hooks the embedding application provides to the engine: client authorization,
/// block policy, follow policy, actor key material and a tap on every processed
/// activity. All are consulted from within request handling, keep them quick.
#[async_trait::async_trait]
pub trait Application : Send + Sync {
	/// authenticate a client-to-server request on this outbox, returning the actor
	/// IRI it is authorized to post as
	async fn authenticate(&self, outbox: &str, authorization: Option<&str>) -> Result<String, PolicyError>;

	/// whether any of these actor IRIs is blocked by this server
	async fn blocked(&self, actors: &[String]) -> Result<bool, PolicyError> {
		let _ = actors;
		Ok(false)
	}

	fn follow_policy(&self) -> FollowPolicy {
		FollowPolicy::Manual
	}

	/// signing key for requests issued on behalf of the actor owning this inbox/outbox
	async fn key_material(&self, box_iri: &str) -> Result<KeyMaterial, PolicyError>;

	/// called for every activity that completed processing, including types the
	/// engine has no built-in side effect for
	async fn on_activity(&self, activity: &serde_json::Value) -> Result<(), PolicyError> {
		let _ = activity;
		Ok(())
	}
}
