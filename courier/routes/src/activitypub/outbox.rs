use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::Response;

use courier::actor::ProtocolActor;

use crate::error::ApiError;

const BODY_LIMIT : usize = 1024 * 1024;

pub async fn post(State(actor): State<ProtocolActor>, request: Request) -> Result<Response, ApiError> {
	let (parts, body) = request.into_parts();
	if !super::is_activity_pub_post(&parts.method, &parts.headers) {
		return Err(ApiError::bad_request());
	}
	let outbox = super::request_id(&parts.uri, &parts.headers);
	let authorization = parts.headers.get(header::AUTHORIZATION)
		.and_then(|x| x.to_str().ok());

	let ctx = actor.context();
	let poster = ctx.app().authenticate(&outbox, authorization).await?;

	let bytes = axum::body::to_bytes(body, BODY_LIMIT).await
		.map_err(|_| ApiError::bad_request())?;
	let value : serde_json::Value = serde_json::from_slice(&bytes)?;

	let aid = actor.post_outbox(&outbox, value, &poster).await?;

	Ok(axum::http::Response::builder()
		.status(StatusCode::CREATED)
		.header(header::LOCATION, &aid)
		.body(axum::body::Body::empty())
		.expect("response assembly cannot fail with valid headers"))
}
