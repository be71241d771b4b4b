pub mod inbox;
pub mod outbox;
pub mod object;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};

use courier::actor::ProtocolActor;

use crate::error::ApiError;

pub fn is_activity_pub_post(method: &Method, headers: &HeaderMap) -> bool {
	method == Method::POST && headers.get(header::CONTENT_TYPE)
		.and_then(|x| x.to_str().ok())
		.is_some_and(apv::jsonld::is_activity_pub_content_type)
}

pub fn is_activity_pub_get(method: &Method, headers: &HeaderMap) -> bool {
	method == Method::GET && headers.get(header::ACCEPT)
		.and_then(|x| x.to_str().ok())
		.is_some_and(apv::jsonld::is_activity_pub_content_type)
}

pub fn is_activity_pub_request(method: &Method, headers: &HeaderMap) -> bool {
	is_activity_pub_get(method, headers) || is_activity_pub_post(method, headers)
}

/// ActivityPub id of the requested resource; ids are always https
pub fn request_id(uri: &Uri, headers: &HeaderMap) -> String {
	let host = uri.authority()
		.map(|x| x.as_str().to_string())
		.or_else(|| headers.get(header::HOST).and_then(|x| x.to_str().ok()).map(|x| x.to_string()))
		.unwrap_or_default();
	let path = uri.path_and_query().map(|x| x.as_str()).unwrap_or("/");
	format!("https://{host}{path}")
}

/// one POST entry point for layouts where the database decides which box a path
/// names, so inbox and outbox paths need no separate mounting
pub async fn post_any(State(actor): State<ProtocolActor>, request: Request) -> Result<Response, ApiError> {
	let iri = request_id(request.uri(), request.headers());
	let ctx = actor.context();
	if ctx.db().actor_for_inbox(&iri).await.is_ok() {
		inbox::post(State(actor), request).await.map(|x| x.into_response())
	} else if ctx.db().actor_for_outbox(&iri).await.is_ok() {
		outbox::post(State(actor), request).await
	} else {
		Err(ApiError::not_found())
	}
}
