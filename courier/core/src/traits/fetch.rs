use apv::{Actor, Base, PublicKey};

use crate::Context;
use crate::transport::RequestError;

#[derive(Debug, thiserror::Error)]
pub enum PullError {
	#[error("failed fetching resource: {0:?}")]
	Request(#[from] RequestError),

	#[error("fetched resource is not valid json: {0:?}")]
	Json(#[from] serde_json::Error),

	#[error("fetched resource is malformed: {0:?}")]
	Malformed(#[from] apv::FieldErr),

	#[error("storage error while resolving resource: {0:?}")]
	Storage(#[from] crate::traits::store::StorageError),

	#[error("too many redirects while resolving resource id, aborting")]
	TooManyRedirects,
}

#[async_trait::async_trait]
pub trait Fetcher {
	/// resolve an IRI to a document: local storage first, remote dereference on miss
	async fn resolve(&self, iri: &str, box_iri: &str) -> Result<serde_json::Value, PullError>;

	/// dereference a remote document, following id mismatches up to the configured limit
	async fn pull(&self, iri: &str, box_iri: &str) -> Result<serde_json::Value, PullError>;

	/// public key of the actor owning `key_id`, as an (owner, pem) pair
	async fn public_key_for(&self, key_id: &str, box_iri: &str) -> Result<(String, String), PullError>;
}

#[async_trait::async_trait]
impl Fetcher for Context {
	async fn resolve(&self, iri: &str, box_iri: &str) -> Result<serde_json::Value, PullError> {
		if self.db().exists(iri).await? {
			return Ok(self.db().get(iri).await?);
		}
		self.pull(iri, box_iri).await
	}

	async fn pull(&self, iri: &str, box_iri: &str) -> Result<serde_json::Value, PullError> {
		let transport = self.transport(box_iri).await?;
		let mut target = iri.to_string();
		for _ in 0..=self.cfg().security.max_id_redirects {
			tracing::debug!("fetching {target}");
			let document : serde_json::Value = serde_json::from_slice(
				&transport.dereference(&target).await?
			)?;
			let document_id = document.id()?;
			if document_id == target {
				return Ok(document);
			}
			// document lives under another id, fetch the canonical one
			target = document_id.to_string();
		}
		Err(PullError::TooManyRedirects)
	}

	async fn public_key_for(&self, key_id: &str, box_iri: &str) -> Result<(String, String), PullError> {
		let document = self.resolve(key_id, box_iri).await?;

		// usually the key document is the actor itself, with the key embedded
		match document.public_key().extract() {
			Some(key) => {
				let owner = match key.owner() {
					Ok(owner) => owner.to_string(),
					Err(_) => document.id()?.to_string(),
				};
				Ok((owner, key.public_key_pem()?.to_string()))
			},
			// or a bare key document carrying its owner
			None => Ok((
				document.owner()?.to_string(),
				document.public_key_pem()?.to_string(),
			)),
		}
	}
}
