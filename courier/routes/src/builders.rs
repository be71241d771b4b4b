use axum::http::{header, StatusCode};
use axum::response::Response;

use courier::Context;

/// Serialize a json-ld document the ActivityPub way: the activitystreams content
/// type, a Date header and a Digest of the body on every response.
pub fn activity_response(ctx: &Context, status: StatusCode, value: &serde_json::Value) -> Response {
	let body = serde_json::to_vec(value).unwrap_or_default();
	let date = ctx.now().format(courier::transport::DATE_FORMAT).to_string();
	let digest = courier::httpsign::digest(&body);
	axum::http::Response::builder()
		.status(status)
		.header(header::CONTENT_TYPE, apv::jsonld::CONTENT_TYPE_LD_JSON_ACTIVITYPUB)
		.header(header::DATE, date)
		.header("Digest", digest)
		.body(axum::body::Body::from(body))
		.expect("response assembly cannot fail with valid headers")
}
