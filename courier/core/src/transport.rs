use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, DATE, HOST, USER_AGENT};

use crate::httpsign::{digest, HttpSignature, HttpSignatureError};
use crate::traits::app::KeyMaterial;
use crate::traits::store::Clock;

// rfc 1123, the only date format http servers agree on
pub const DATE_FORMAT : &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
	#[error("error issuing request: {0:?}")]
	Reqwest(#[from] reqwest::Error),

	#[error("request to {url} failed with status {status}")]
	Failed { status: reqwest::StatusCode, url: String },

	#[error("invalid url '{0}': {1}")]
	Url(String, String),

	#[error("invalid header value: {0}")]
	Header(#[from] reqwest::header::InvalidHeaderValue),

	#[error("error constructing http signature: {0:?}")]
	HttpSignature(#[from] HttpSignatureError),

	#[error("could not load actor key material: {0}")]
	Keys(#[from] crate::traits::app::PolicyError),
}

/// all failed recipients of one batch, with the error each one produced
#[derive(Debug, thiserror::Error)]
#[error("batch delivery had at least one failure: {failures:?}")]
pub struct DeliveryError {
	pub failures: Vec<(String, String)>,
}

/// outgoing http, behind a trait so transports can run against a recording stub
#[async_trait::async_trait]
pub trait HttpClient : Send + Sync {
	async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error>;
}

#[async_trait::async_trait]
impl HttpClient for reqwest::Client {
	async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error> {
		reqwest::Client::execute(self, request).await
	}
}

/// A signing identity for one actor. The underlying signature state is rebuilt on
/// every request and is not reentrant, so signing serializes through a mutex; the
/// http call itself happens outside the critical section.
pub struct Signer {
	private_key_pem: String,
	inner: tokio::sync::Mutex<HttpSignature>,
}

impl Signer {
	pub fn new(key_id: String, private_key_pem: String) -> Self {
		Signer {
			private_key_pem,
			inner: tokio::sync::Mutex::new(HttpSignature::new(
				key_id,
				"rsa-sha256".to_string(),
				&["(request-target)", "host", "date", "digest"],
			)),
		}
	}

	pub async fn sign(&self, method: &str, target: &str, headers: BTreeMap<String, String>) -> Result<String, HttpSignatureError> {
		let mut signature = self.inner.lock().await;
		signature.build_manually(method, target, headers).sign(&self.private_key_pem)?;
		Ok(signature.header())
	}
}

/// Issues GET and POST requests on behalf of a single actor, with http signatures.
/// Reusable across requests, but scoped to that one actor.
pub struct Transport {
	client: Arc<dyn HttpClient>,
	clock: Arc<dyn Clock>,
	user_agent: String,
	get_signer: Signer,
	post_signer: Signer,
}

fn split_url(url: &str) -> Result<(reqwest::Url, String, String), RequestError> {
	let parsed = reqwest::Url::parse(url)
		.map_err(|e| RequestError::Url(url.to_string(), e.to_string()))?;
	let host = parsed.host_str()
		.ok_or_else(|| RequestError::Url(url.to_string(), "missing host".to_string()))?
		.to_string();
	let target = match parsed.query() {
		Some(query) => format!("{}?{query}", parsed.path()),
		None => parsed.path().to_string(),
	};
	Ok((parsed, host, target))
}

fn is_success(status: reqwest::StatusCode) -> bool {
	status == reqwest::StatusCode::OK
		|| status == reqwest::StatusCode::CREATED
		|| status == reqwest::StatusCode::ACCEPTED
}

impl Transport {
	pub fn new(client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>, user_agent: String, keys: KeyMaterial) -> Self {
		Transport {
			client,
			clock,
			user_agent,
			get_signer: Signer::new(keys.key_id.clone(), keys.private_key_pem.clone()),
			post_signer: Signer::new(keys.key_id, keys.private_key_pem),
		}
	}

	/// fetch the ActivityStreams document at this IRI with a signed GET
	pub async fn dereference(&self, iri: &str) -> Result<Vec<u8>, RequestError> {
		let (url, host, target) = split_url(iri)?;
		let date = self.clock.now().format(DATE_FORMAT).to_string();
		// sign the digest of the empty body so the signed header set matches deliveries
		let empty_digest = digest(b"");

		let signature = self.get_signer.sign("get", &target, BTreeMap::from([
			("host".to_string(), host.clone()),
			("date".to_string(), date.clone()),
			("digest".to_string(), empty_digest.clone()),
		])).await?;

		let mut request = reqwest::Request::new(reqwest::Method::GET, url);
		let headers = request.headers_mut();
		headers.insert(ACCEPT, "application/activity+json; profile=\"https://www.w3.org/ns/activitystreams\"".parse()?);
		headers.insert("Accept-Charset", "utf-8".parse()?);
		headers.insert(DATE, date.parse()?);
		headers.insert(HOST, host.parse()?);
		headers.insert(USER_AGENT, self.user_agent.parse()?);
		headers.insert("Digest", empty_digest.parse()?);
		headers.insert("Signature", signature.parse()?);

		let response = self.client.execute(request).await?;
		let status = response.status();
		if status != reqwest::StatusCode::OK {
			return Err(RequestError::Failed { status, url: iri.to_string() });
		}

		Ok(response.bytes().await?.to_vec())
	}

	/// send a serialized activity to one inbox with a signed POST
	pub async fn deliver(&self, payload: &[u8], to: &str) -> Result<(), RequestError> {
		let (url, host, target) = split_url(to)?;
		let date = self.clock.now().format(DATE_FORMAT).to_string();
		let body_digest = digest(payload);

		let signature = self.post_signer.sign("post", &target, BTreeMap::from([
			("host".to_string(), host.clone()),
			("date".to_string(), date.clone()),
			("digest".to_string(), body_digest.clone()),
		])).await?;

		let mut request = reqwest::Request::new(reqwest::Method::POST, url);
		let headers = request.headers_mut();
		headers.insert(ACCEPT, apv::jsonld::CONTENT_TYPE_ACTIVITY_JSON.parse()?);
		headers.insert("Accept-Charset", "utf-8".parse()?);
		headers.insert(CONTENT_TYPE, apv::jsonld::CONTENT_TYPE_LD_JSON_ACTIVITYPUB.parse()?);
		headers.insert(DATE, date.parse()?);
		headers.insert(HOST, host.parse()?);
		headers.insert(USER_AGENT, self.user_agent.parse()?);
		headers.insert("Digest", body_digest.parse()?);
		headers.insert("Signature", signature.parse()?);
		*request.body_mut() = Some(payload.to_vec().into());

		let response = self.client.execute(request).await?;
		let status = response.status();
		if !is_success(status) {
			return Err(RequestError::Failed { status, url: to.to_string() });
		}

		Ok(())
	}

	/// deliver the same payload to many inboxes concurrently; failures are collected,
	/// never retried, and reported together after every recipient was attempted
	pub async fn batch_deliver(&self, payload: &[u8], recipients: &[String]) -> Result<(), DeliveryError> {
		let results = futures::future::join_all(
			recipients.iter().map(|recipient| async move {
				(recipient.clone(), self.deliver(payload, recipient).await)
			})
		).await;

		let failures : Vec<(String, String)> = results
			.into_iter()
			.filter_map(|(recipient, res)| res.err().map(|e| (recipient, e.to_string())))
			.collect();

		if failures.is_empty() {
			Ok(())
		} else {
			Err(DeliveryError { failures })
		}
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use crate::testing::{FixedClock, StubClient};
	use crate::traits::app::KeyMaterial;
	use super::Transport;

	fn transport(client: Arc<StubClient>) -> Transport {
		let rsa = openssl::rsa::Rsa::generate(2048).expect("rsa keygen");
		let pem = String::from_utf8(rsa.private_key_to_pem().expect("pem")).expect("utf8");
		Transport::new(
			client,
			Arc::new(FixedClock::default()),
			"test courier/0.0".to_string(),
			KeyMaterial {
				key_id: "https://a.example/a#main-key".to_string(),
				private_key_pem: pem,
			},
		)
	}

	#[tokio::test]
	async fn dereference_sends_signed_headers_and_wants_ok() {
		let client = StubClient::new();
		client.serve("https://b.example/b", serde_json::json!({"id": "https://b.example/b"}));
		let t = transport(client.clone());

		let body = t.dereference("https://b.example/b").await.expect("dereference failed");
		assert!(!body.is_empty());

		let requests = client.recorded();
		assert_eq!(requests.len(), 1);
		let request = &requests[0];
		assert_eq!(request.method, "GET");
		for header in ["accept", "accept-charset", "date", "host", "user-agent", "digest", "signature"] {
			assert!(request.header(header).is_some(), "missing {header} header");
		}
		assert_eq!(request.header("host").unwrap(), "b.example");
		assert_eq!(request.header("date").unwrap(), "Sat, 13 Apr 2024 13:36:23 GMT");
	}

	#[tokio::test]
	async fn dereference_refuses_anything_but_ok() {
		let client = StubClient::new();
		client.respond("https://b.example/gone", 410);
		let t = transport(client);

		let result = t.dereference("https://b.example/gone").await;
		assert!(matches!(result, Err(super::RequestError::Failed { status, .. }) if status.as_u16() == 410));
	}

	#[tokio::test]
	async fn deliver_accepts_accepted() {
		let client = StubClient::new();
		client.respond("https://b.example/b/inbox", 202);
		let t = transport(client.clone());

		t.deliver(b"{}", "https://b.example/b/inbox").await.expect("delivery refused");

		let request = &client.recorded()[0];
		assert_eq!(request.method, "POST");
		assert_eq!(request.body.as_deref(), Some(b"{}" as &[u8]));
		assert!(request.header("digest").unwrap().starts_with("SHA-256="));
	}

	#[tokio::test]
	async fn batch_delivery_reports_every_failure_after_trying_everyone() {
		let client = StubClient::new();
		client.respond("https://b.example/b/inbox", 500);
		client.respond("https://d.example/d/inbox", 403);
		let t = transport(client.clone());

		let recipients = vec![
			"https://b.example/b/inbox".to_string(),
			"https://c.example/c/inbox".to_string(),
			"https://d.example/d/inbox".to_string(),
		];
		let result = t.batch_deliver(b"{}", &recipients).await;

		let error = result.expect_err("batch should report failures");
		assert_eq!(error.failures.len(), 2);
		// every recipient was still attempted
		assert_eq!(client.recorded().len(), 3);
	}
}
