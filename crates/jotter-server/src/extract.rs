use axum::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, Path, Request};
use serde::de::DeserializeOwned;

use jotter_types::RecordId;

use crate::error::{ApiError, ApiResult};

/// JSON request body.
///
/// Unlike `axum::Json`, any content type is accepted; only the bytes have to
/// parse. Empty or unparseable bodies are rejected with 400.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::MalformedBody(e.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::MalformedBody(e.to_string()))
    }
}

/// Unwrap a numeric id path segment, turning a parse failure into 400.
pub fn record_id(path: Result<Path<RecordId>, PathRejection>) -> ApiResult<RecordId> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::InvalidPath(e.body_text()))
}
