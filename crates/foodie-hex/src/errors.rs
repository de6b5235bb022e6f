use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use foodie_types::ports::RepoError;
use thiserror::Error;

use crate::inbound::http::envelope::ApiResponse;

pub const UPLOAD_TOO_LARGE_MSG: &str =
    "upload must not exceed 500KB, compress the image or lower its quality";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        tracing::error!(error = %e, "store failure");
        AppError::Internal(anyhow::anyhow!(e.to_string()))
    }
}

// Extractor failures keep 413 for oversized bodies; anything else is bad input.
fn rejected(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    tracing::debug!(%status, reason = %text, "request rejected by extractor");
    AppError::InvalidInput(text)
}

impl From<JsonRejection> for AppError {
    fn from(r: JsonRejection) -> Self {
        rejected(r.status(), r.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(r: QueryRejection) -> Self {
        rejected(r.status(), r.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(r: FormRejection) -> Self {
        rejected(r.status(), r.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let msg = match &self {
            AppError::InvalidInput(m)
            | AppError::Validation(m)
            | AppError::NotFound(m)
            | AppError::InvalidTransition(m) => m.clone(),
            AppError::PayloadTooLarge => UPLOAD_TOO_LARGE_MSG.into(),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                "internal error".into()
            }
        };
        ApiResponse::<()>::error(code, msg).into_response()
    }
}
