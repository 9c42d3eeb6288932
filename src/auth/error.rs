use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::auth::dto::{BareMessage, MessageResponse};

/// Failure of a register or login call.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user already exists")]
    Conflict,
    /// Unknown email and wrong password share this variant.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Conflict => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::Conflict => "User already exists!",
            Self::InvalidCredentials => "Invalid email or password",
            Self::Internal(_) => "Internal Server Error",
        }
    }
}

/// A body that cannot be read as the expected JSON is a server-side
/// failure like any other; the rejection text only reaches the logs.
impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Internal(anyhow::anyhow!(
            "unreadable request body: {}",
            rejection.body_text()
        ))
    }
}

impl IntoResponse for AuthError {
    /// Internal errors are logged with their full chain and reach the client
    /// only as a generic 500.
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::InvalidCredentials => {
                (status, Json(BareMessage::new(self.public_message()))).into_response()
            }
            Self::Internal(ref e) => {
                error!(error = ?e, "request failed");
                (status, Json(MessageResponse::failure(self.public_message()))).into_response()
            }
            Self::Conflict => {
                (status, Json(MessageResponse::failure(self.public_message()))).into_response()
            }
        }
    }
}
