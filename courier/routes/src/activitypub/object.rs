use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;

use apv::{Object, ObjectType, LD};
use courier::actor::ProtocolActor;

use crate::builders::activity_response;
use crate::error::ApiError;

/// serve any locally owned resource as json-ld: tombstoned resources answer with
/// 410 and the tombstone itself, everything unknown is 404
pub async fn get(State(actor): State<ProtocolActor>, request: Request) -> Result<Response, ApiError> {
	let (parts, _) = request.into_parts();
	if !super::is_activity_pub_get(&parts.method, &parts.headers) {
		return Err(ApiError::not_found());
	}
	let iri = super::request_id(&parts.uri, &parts.headers);
	let ctx = actor.context();
	if !ctx.db().owns(&iri).await? {
		return Err(ApiError::not_found());
	}
	let document = ctx.db().get(&iri).await?;
	let gone = matches!(document.object_type(), Ok(ObjectType::Tombstone));
	// collections leave here with unique members even if storage picked up strays
	let document = match document.object_type() {
		Ok(ObjectType::Collection(_)) => courier::traits::normalize::dedupe_ordered_items(document.clone())
			.unwrap_or(document),
		_ => document,
	};
	let document = document.ld_context();
	if gone {
		Ok(activity_response(ctx, StatusCode::GONE, &document))
	} else {
		Ok(activity_response(ctx, StatusCode::OK, &document))
	}
}
