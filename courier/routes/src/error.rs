use axum::http::StatusCode;

use courier::traits::app::PolicyError;
use courier::traits::normalize::NormalizerError;
use courier::traits::process::ProcessorError;
use courier::traits::store::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("encountered malformed object: {0}")]
	Field(#[from] apv::FieldErr),

	#[error("invalid json payload: {0:?}")]
	Json(#[from] serde_json::Error),

	#[error("refused by application policy: {0}")]
	Policy(#[from] PolicyError),

	#[error("processing failed: {0:?}")]
	Processor(#[from] ProcessorError),

	#[error("storage failure: {0:?}")]
	Storage(#[from] StorageError),

	// wrapper to return arbitrary status codes
	#[error("{0}")]
	Status(StatusCode),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
	pub fn bad_request() -> Self {
		Self::Status(StatusCode::BAD_REQUEST)
	}

	pub fn unauthorized() -> Self {
		Self::Status(StatusCode::UNAUTHORIZED)
	}

	pub fn forbidden() -> Self {
		Self::Status(StatusCode::FORBIDDEN)
	}

	pub fn not_found() -> Self {
		Self::Status(StatusCode::NOT_FOUND)
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Field(_) | Self::Json(_) => StatusCode::BAD_REQUEST,
			Self::Policy(PolicyError::Unauthorized) => StatusCode::UNAUTHORIZED,
			Self::Policy(_) => StatusCode::FORBIDDEN,
			Self::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
			Self::Storage(StorageError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::Status(status) => *status,
			Self::Processor(e) => match e {
				ProcessorError::Malformed(_)
					| ProcessorError::ObjectRequired
					| ProcessorError::TargetRequired
					| ProcessorError::Json(_)
					| ProcessorError::Unprocessable(_) => StatusCode::BAD_REQUEST,
				ProcessorError::NotEnabled => StatusCode::METHOD_NOT_ALLOWED,
				ProcessorError::Unauthorized => StatusCode::FORBIDDEN,
				ProcessorError::Policy(PolicyError::Unauthorized) => StatusCode::UNAUTHORIZED,
				ProcessorError::Policy(_) => StatusCode::FORBIDDEN,
				ProcessorError::Normalizer(n) => match n {
					NormalizerError::OriginMismatch(_) | NormalizerError::ActorMismatch => StatusCode::FORBIDDEN,
					NormalizerError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
					NormalizerError::Storage(_) | NormalizerError::Pull(_) => StatusCode::INTERNAL_SERVER_ERROR,
					_ => StatusCode::BAD_REQUEST,
				},
				ProcessorError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
				ProcessorError::Storage(_) | ProcessorError::Pull(_) => StatusCode::INTERNAL_SERVER_ERROR,
			},
		}
	}
}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		tracing::debug!("emitting error response: {self:?}");
		let status = self.status_code();
		(
			status,
			axum::Json(serde_json::json!({
				"error": status.canonical_reason().unwrap_or("unknown"),
				"description": self.to_string(),
			})),
		).into_response()
	}
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use courier::traits::app::PolicyError;
	use courier::traits::normalize::NormalizerError;
	use courier::traits::process::ProcessorError;

	use super::ApiError;

	#[test]
	fn processor_errors_map_to_protocol_status_codes() {
		assert_eq!(ApiError::from(ProcessorError::ObjectRequired).status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(ApiError::from(ProcessorError::TargetRequired).status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(ApiError::from(ProcessorError::Unauthorized).status_code(), StatusCode::FORBIDDEN);
		assert_eq!(ApiError::from(ProcessorError::NotEnabled).status_code(), StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(
			ApiError::from(ProcessorError::Policy(PolicyError::Unauthorized)).status_code(),
			StatusCode::UNAUTHORIZED,
		);
		assert_eq!(
			ApiError::from(ProcessorError::Policy(PolicyError::Forbidden)).status_code(),
			StatusCode::FORBIDDEN,
		);
		assert_eq!(
			ApiError::from(ProcessorError::Normalizer(NormalizerError::OriginMismatch("x".into()))).status_code(),
			StatusCode::FORBIDDEN,
		);
	}
}
