//! Error taxonomy of the resource API and its HTTP rendering.

use assistd_core::error::{AgentError, StoreError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Every way a resource operation can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    /// The route exists but the operation is not offered.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The agent engine failed while stepping.
    #[error("{0}")]
    EngineFailure(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::EngineFailure(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `error.type` value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::NotImplemented(_) => "not_implemented",
            Self::EngineFailure(_) => "engine_failure",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CursorNotFound { message_id, .. } => {
                Self::NotFound(format!("No message found with ID {message_id}"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::NotFound(id) => Self::NotFound(format!("No thread found with ID {id}")),
            quota @ AgentError::QuotaExceeded { .. } => Self::NotFound(quota.to_string()),
            step @ AgentError::Step { .. } => Self::EngineFailure(step.to_string()),
            AgentError::Store(store) => store.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && !matches!(self, Self::NotImplemented(_)) {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        }

        (
            status,
            Json(json!({
                "error": {
                    "type": self.kind(),
                    "message": self.to_string(),
                    "status": status.as_u16(),
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistd_core::error::ProviderError;
    use uuid::Uuid;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(ApiError::invalid("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::NotImplemented("list_assistants").status(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            ApiError::EngineFailure("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn agent_errors_map_to_api_errors() {
        let missing: ApiError = AgentError::NotFound(Uuid::new_v4()).into();
        assert_eq!(missing.kind(), "not_found");

        let quota: ApiError = AgentError::QuotaExceeded {
            user_id: "u".into(),
            limit: 1,
        }
        .into();
        assert_eq!(quota.kind(), "not_found");

        let step: ApiError = AgentError::Step {
            agent_id: Uuid::new_v4(),
            source: ProviderError::Timeout("60s".into()),
        }
        .into();
        assert_eq!(step.kind(), "engine_failure");

        let storage: ApiError = AgentError::Store(StoreError::Storage("disk".into())).into();
        assert_eq!(storage.kind(), "internal_error");
    }

    #[test]
    fn unknown_cursor_is_not_found() {
        let err: ApiError = StoreError::CursorNotFound {
            agent_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
