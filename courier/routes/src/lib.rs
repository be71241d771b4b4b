pub mod error;
pub mod builders;
pub mod activitypub;

pub use error::{ApiError, ApiResult};

use axum::routing::get;
use courier::actor::ProtocolActor;

/// Catch-all router for the common layout: every GET serves owned resources, every
/// POST lands on whatever box the database says the path names. Embedders with
/// custom path layouts mount the handlers themselves instead.
pub fn router(actor: ProtocolActor) -> axum::Router {
	axum::Router::new()
		.route("/{*path}", get(activitypub::object::get).post(activitypub::post_any))
		.with_state(actor)
}
