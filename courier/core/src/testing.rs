//! In-memory stand-ins for every injected capability, shared by the test modules.

use std::sync::{Arc, Mutex};

use apv::{ActorMut, Base, BaseMut, Collection, CollectionMut, CollectionType, Node, ObjectMut, ObjectType};

use crate::config::Config;
use crate::context::Context;
use crate::locks::{IriGuard, IriLocks};
use crate::traits::app::{Application, FollowPolicy, KeyMaterial, PolicyError};
use crate::traits::store::{Clock, Database, StorageError};
use crate::transport::HttpClient;

pub struct MemDb {
	host: String,
	store: dashmap::DashMap<String, serde_json::Value>,
	locks: IriLocks,
}

impl MemDb {
	pub fn new(host: &str) -> Arc<Self> {
		Arc::new(MemDb {
			host: host.to_string(),
			store: dashmap::DashMap::new(),
			locks: IriLocks::default(),
		})
	}

	pub fn locks(&self) -> &IriLocks {
		&self.locks
	}

	pub fn put(&self, value: serde_json::Value) {
		let id = value.id().expect("test fixture without id").to_string();
		self.store.insert(id, value);
	}

	pub fn snapshot(&self, iri: &str) -> Option<serde_json::Value> {
		self.store.get(iri).map(|x| x.clone())
	}

	fn empty_collection(id: &str) -> serde_json::Value {
		apv::new()
			.set_id(Some(id))
			.set_collection_type(Some(CollectionType::OrderedCollection))
			.set_ordered_items(Node::from(serde_json::Value::Array(Vec::new())))
	}

	/// store an actor document along with its empty inbox, outbox, followers and
	/// following collections, wired the way this database names them
	pub fn seed_actor(&self, actor: &str) {
		let document = apv::new()
			.set_id(Some(actor))
			.set_object_type(Some(ObjectType::Actor(apv::ActorType::Person)))
			.set_inbox(Node::link(format!("{actor}/inbox")))
			.set_outbox(Node::link(format!("{actor}/outbox")))
			.set_followers(Node::link(format!("{actor}/followers")))
			.set_following(Node::link(format!("{actor}/following")));
		self.put(document);
		for suffix in ["inbox", "outbox", "followers", "following"] {
			self.put(Self::empty_collection(&format!("{actor}/{suffix}")));
		}
	}

	pub fn collection_ids(&self, iri: &str) -> Vec<String> {
		self.snapshot(iri)
			.map(|x| x.ordered_items().ids())
			.unwrap_or_default()
	}
}

#[async_trait::async_trait]
impl Database for MemDb {
	async fn lock(&self, iri: &str) -> Result<IriGuard, StorageError> {
		Ok(self.locks.acquire(iri).await)
	}

	async fn owns(&self, iri: &str) -> Result<bool, StorageError> {
		Ok(self.store.contains_key(iri))
	}

	async fn exists(&self, iri: &str) -> Result<bool, StorageError> {
		Ok(self.store.contains_key(iri))
	}

	async fn get(&self, iri: &str) -> Result<serde_json::Value, StorageError> {
		self.store.get(iri)
			.map(|x| x.clone())
			.ok_or_else(|| StorageError::NotFound(iri.to_string()))
	}

	async fn create(&self, value: serde_json::Value) -> Result<(), StorageError> {
		let id = value.id()
			.map_err(|e| StorageError::Internal(e.to_string()))?
			.to_string();
		self.store.insert(id, value);
		Ok(())
	}

	async fn update(&self, value: serde_json::Value) -> Result<(), StorageError> {
		self.create(value).await
	}

	async fn delete(&self, iri: &str) -> Result<(), StorageError> {
		self.store.remove(iri);
		Ok(())
	}

	async fn inbox_contains(&self, inbox: &str, id: &str) -> Result<bool, StorageError> {
		Ok(self.collection_ids(inbox).iter().any(|x| x == id))
	}

	async fn inbox_for_actor(&self, actor: &str) -> Result<String, StorageError> {
		Ok(format!("{actor}/inbox"))
	}

	async fn outbox_for_inbox(&self, inbox: &str) -> Result<String, StorageError> {
		let actor = inbox.strip_suffix("/inbox")
			.ok_or_else(|| StorageError::NotFound(inbox.to_string()))?;
		Ok(format!("{actor}/outbox"))
	}

	async fn actor_for_inbox(&self, inbox: &str) -> Result<String, StorageError> {
		inbox.strip_suffix("/inbox")
			.map(|x| x.to_string())
			.ok_or_else(|| StorageError::NotFound(inbox.to_string()))
	}

	async fn actor_for_outbox(&self, outbox: &str) -> Result<String, StorageError> {
		outbox.strip_suffix("/outbox")
			.map(|x| x.to_string())
			.ok_or_else(|| StorageError::NotFound(outbox.to_string()))
	}

	async fn new_id(&self, _value: &serde_json::Value) -> Result<String, StorageError> {
		Ok(format!("https://{}/items/{}", self.host, uuid::Uuid::new_v4()))
	}
}

#[derive(Clone, Copy)]
pub struct FixedClock(pub chrono::DateTime<chrono::Utc>);

impl Default for FixedClock {
	fn default() -> Self {
		FixedClock(chrono::DateTime::parse_from_rfc3339("2024-04-13T13:36:23Z").expect("valid timestamp").with_timezone(&chrono::Utc))
	}
}

impl Clock for FixedClock {
	fn now(&self) -> chrono::DateTime<chrono::Utc> {
		self.0
	}
}

pub struct TestApp {
	pub actor: String,
	pub policy: FollowPolicy,
	pub blocked: Vec<String>,
	pub keys: KeyMaterial,
}

impl TestApp {
	pub fn new(actor: &str) -> Self {
		let rsa = openssl::rsa::Rsa::generate(2048).expect("rsa keygen");
		let pem = String::from_utf8(rsa.private_key_to_pem().expect("pem encoding")).expect("pem is utf8");
		TestApp {
			actor: actor.to_string(),
			policy: FollowPolicy::Manual,
			blocked: Vec::new(),
			keys: KeyMaterial {
				key_id: format!("{actor}#main-key"),
				private_key_pem: pem,
			},
		}
	}

	pub fn with_policy(mut self, policy: FollowPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn with_blocked(mut self, actor: &str) -> Self {
		self.blocked.push(actor.to_string());
		self
	}
}

#[async_trait::async_trait]
impl Application for TestApp {
	async fn authenticate(&self, _outbox: &str, authorization: Option<&str>) -> Result<String, PolicyError> {
		match authorization {
			Some("Bearer test-token") => Ok(self.actor.clone()),
			_ => Err(PolicyError::Unauthorized),
		}
	}

	async fn blocked(&self, actors: &[String]) -> Result<bool, PolicyError> {
		Ok(actors.iter().any(|x| self.blocked.contains(x)))
	}

	fn follow_policy(&self) -> FollowPolicy {
		self.policy
	}

	async fn key_material(&self, _box_iri: &str) -> Result<KeyMaterial, PolicyError> {
		Ok(self.keys.clone())
	}
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub method: String,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	pub fn json(&self) -> serde_json::Value {
		serde_json::from_slice(self.body.as_deref().unwrap_or(b"{}")).expect("recorded body is json")
	}
}

/// Never talks to the network: GETs answer from a canned document map, POSTs answer
/// with a canned status. Every request is recorded, and issuing one while any
/// database lock is held trips an assertion.
pub struct StubClient {
	requests: Mutex<Vec<RecordedRequest>>,
	documents: dashmap::DashMap<String, serde_json::Value>,
	statuses: dashmap::DashMap<String, u16>,
	watched_locks: Mutex<Vec<IriLocks>>,
}

impl StubClient {
	pub fn new() -> Arc<Self> {
		Arc::new(StubClient {
			requests: Mutex::new(Vec::new()),
			documents: dashmap::DashMap::new(),
			statuses: dashmap::DashMap::new(),
			watched_locks: Mutex::new(Vec::new()),
		})
	}

	pub fn serve(&self, url: &str, document: serde_json::Value) {
		self.documents.insert(url.to_string(), document);
	}

	pub fn respond(&self, url: &str, status: u16) {
		self.statuses.insert(url.to_string(), status);
	}

	/// panic if a request goes out while any of these locks is held
	pub fn watch(&self, locks: IriLocks) {
		self.watched_locks.lock().expect("lock watch poisoned").push(locks);
	}

	pub fn recorded(&self) -> Vec<RecordedRequest> {
		self.requests.lock().expect("requests poisoned").clone()
	}

	pub fn posts_to(&self, url: &str) -> Vec<RecordedRequest> {
		self.recorded()
			.into_iter()
			.filter(|x| x.method == "POST" && x.url == url)
			.collect()
	}
}

#[async_trait::async_trait]
impl HttpClient for StubClient {
	async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error> {
		for locks in self.watched_locks.lock().expect("lock watch poisoned").iter() {
			assert_eq!(locks.held(), 0, "transport call while a database lock is held");
		}

		let url = request.url().to_string();
		let recorded = RecordedRequest {
			method: request.method().to_string(),
			url: url.clone(),
			headers: request.headers()
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
				.collect(),
			body: request.body().and_then(|x| x.as_bytes()).map(|x| x.to_vec()),
		};
		self.requests.lock().expect("requests poisoned").push(recorded);

		let status = self.statuses.get(&url).map(|x| *x).unwrap_or(200);
		let body = if request.method() == reqwest::Method::GET {
			self.documents.get(&url)
				.map(|x| x.to_string())
				.unwrap_or_else(|| {
					tracing::warn!("stub client has no document for {url}");
					String::new()
				})
		} else {
			String::new()
		};

		let response = http::Response::builder()
			.status(status)
			.body(body)
			.expect("stub response");
		Ok(reqwest::Response::from(response))
	}
}

/// a fully wired engine over in-memory parts
pub struct Harness {
	pub ctx: Context,
	pub db: Arc<MemDb>,
	pub client: Arc<StubClient>,
	pub clock: FixedClock,
}

pub fn harness(host: &str, app: TestApp) -> Harness {
	harness_with(host, app, Config::default())
}

pub fn harness_with(host: &str, app: TestApp, cfg: Config) -> Harness {
	let db = MemDb::new(host);
	let client = StubClient::new();
	client.watch(db.locks().clone());
	let clock = FixedClock::default();
	let ctx = Context::new(
		cfg,
		db.clone(),
		Arc::new(clock),
		Arc::new(app),
		client.clone(),
	);
	Harness { ctx, db, client, clock }
}
