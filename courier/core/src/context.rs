use std::sync::Arc;

use crate::config::Config;
use crate::traits::app::Application;
use crate::traits::store::{Clock, Database};
use crate::transport::{HttpClient, RequestError, Transport};

/// Shared engine state: configuration plus every injected capability. Cheap to clone,
/// everything lives behind one Arc.
#[derive(Clone)]
pub struct Context(Arc<ContextInner>);

struct ContextInner {
	cfg: Config,
	db: Arc<dyn Database>,
	clock: Arc<dyn Clock>,
	app: Arc<dyn Application>,
	client: Arc<dyn HttpClient>,
}

impl Context {
	pub fn new(
		cfg: Config,
		db: Arc<dyn Database>,
		clock: Arc<dyn Clock>,
		app: Arc<dyn Application>,
		client: Arc<dyn HttpClient>,
	) -> Self {
		Context(Arc::new(ContextInner { cfg, db, clock, app, client }))
	}

	pub fn cfg(&self) -> &Config {
		&self.0.cfg
	}

	pub fn db(&self) -> &dyn Database {
		self.0.db.as_ref()
	}

	pub fn app(&self) -> &dyn Application {
		self.0.app.as_ref()
	}

	pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
		self.0.clock.now()
	}

	pub fn clock(&self) -> Arc<dyn Clock> {
		self.0.clock.clone()
	}

	pub fn user_agent(&self) -> String {
		format!("{} courier/{}", self.0.cfg.instance.name, crate::VERSION)
	}

	/// transport issuing requests on behalf of the actor owning this inbox/outbox
	pub async fn transport(&self, box_iri: &str) -> Result<Transport, RequestError> {
		let keys = self.0.app.key_material(box_iri).await?;
		Ok(Transport::new(
			self.0.client.clone(),
			self.0.clock.clone(),
			self.user_agent(),
			keys,
		))
	}

	/// host (authority) portion of an IRI, for origin comparisons
	pub fn server(iri: &str) -> &str {
		iri.split('/').nth(2).unwrap_or("")
	}
}

#[cfg(test)]
mod test {
	use super::Context;

	#[test]
	fn server_extracts_the_authority() {
		assert_eq!(Context::server("https://a.example/users/alice"), "a.example");
		assert_eq!(Context::server("https://b.example:8443/inbox"), "b.example:8443");
		assert_eq!(Context::server("not an iri"), "");
	}
}
