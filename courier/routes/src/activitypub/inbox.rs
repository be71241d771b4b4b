use std::collections::BTreeMap;

use axum::extract::{Request, State};
use axum::http::StatusCode;

use apv::Activity;
use courier::actor::ProtocolActor;
use courier::httpsign::{digest, HttpSignature};
use courier::traits::Fetcher;

use crate::error::ApiError;

const BODY_LIMIT : usize = 1024 * 1024;

pub async fn post(State(actor): State<ProtocolActor>, request: Request) -> Result<StatusCode, ApiError> {
	let (parts, body) = request.into_parts();
	if !super::is_activity_pub_post(&parts.method, &parts.headers) {
		return Err(ApiError::bad_request());
	}
	let inbox = super::request_id(&parts.uri, &parts.headers);
	let bytes = axum::body::to_bytes(body, BODY_LIMIT).await
		.map_err(|_| ApiError::bad_request())?;

	// a digest header must match the body we actually read
	if let Some(declared) = parts.headers.get("digest").and_then(|x| x.to_str().ok()) {
		if declared != digest(&bytes) {
			return Err(ApiError::unauthorized());
		}
	}

	let signature_header = parts.headers.get("signature")
		.and_then(|x| x.to_str().ok())
		.ok_or_else(ApiError::unauthorized)?;
	let mut signature = HttpSignature::parse(signature_header);

	let mut signed_headers = BTreeMap::new();
	for name in &signature.headers {
		if name == "(request-target)" {
			continue;
		}
		let value = parts.headers.get(name.as_str())
			.and_then(|x| x.to_str().ok())
			.unwrap_or("");
		signed_headers.insert(name.clone(), value.to_string());
	}
	let target = parts.uri.path_and_query().map(|x| x.as_str()).unwrap_or("/").to_string();
	signature.build_manually(&parts.method.as_str().to_lowercase(), &target, signed_headers);

	let ctx = actor.context();
	let (owner, key_pem) = ctx.public_key_for(&signature.key_id, &inbox).await
		.map_err(|e| {
			tracing::warn!("could not fetch signing key {}: {e}", signature.key_id);
			ApiError::unauthorized()
		})?;
	if !signature.verify(&key_pem).map_err(|_| ApiError::unauthorized())? {
		return Err(ApiError::unauthorized());
	}

	let activity : serde_json::Value = serde_json::from_slice(&bytes)?;

	// the signing key must belong to the actor carrying out the activity
	if !activity.actor().ids().contains(&owner) {
		return Err(ApiError::unauthorized());
	}

	actor.post_inbox(&inbox, activity).await?;
	Ok(StatusCode::OK)
}
