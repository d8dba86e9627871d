//! Error types for storage, allocation, resolution and the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::model::ApiResponse;

/// Failures reported by a [`LinkStore`](crate::store::LinkStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// The uniqueness constraint on the short code rejected an insert
    #[error("short code already exists: {0}")]
    Conflict(String),

    #[error("no link with short code: {0}")]
    Missing(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

macro_rules! database_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    StoreError::Database(err.to_string())
                }
            }
        )*
    };
}

database_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Outcomes of [`Allocator::allocate`](crate::allocator::Allocator::allocate)
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("invalid short code format: {0}")]
    InvalidFormat(String),

    #[error("short code already taken: {0}")]
    CodeTaken(String),

    #[error("no free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Outcomes of [`resolve`](crate::resolver::resolve) other than a redirect
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("link not found")]
    NotFound,

    #[error("link expired")]
    Expired,

    #[error("server error: {0}")]
    ServerError(#[from] StoreError),
}

impl ResolutionError {
    /// Value of the `error` query parameter on the landing page
    pub fn reason(&self) -> &'static str {
        match self {
            ResolutionError::NotFound => "not-found",
            ResolutionError::Expired => "expired",
            ResolutionError::ServerError(_) => "server-error",
        }
    }
}

pub const INVALID_URL_MESSAGE: &str = "Invalid URL provided";
pub const INVALID_CODE_MESSAGE: &str =
    "Short link must be 3-50 characters and contain only letters, numbers, hyphens, and underscores";

/// Errors returned by the API handlers
///
/// Every variant renders as the `{ "success": false, "error": ... }`
/// envelope; internal details are logged, never sent to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("URL not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::failure(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "storage failure");
        ApiError::Internal("Internal server error".to_string())
    }
}

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::InvalidFormat(_) => ApiError::BadRequest(INVALID_CODE_MESSAGE.to_string()),
            AllocationError::CodeTaken(_) => ApiError::Conflict("Custom code already exists".to_string()),
            AllocationError::AllocationExhausted { attempts } => {
                error!(attempts, "short code space exhausted");
                ApiError::Internal("Failed to generate unique short code".to_string())
            }
            AllocationError::Storage(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_errors_map_to_distinct_statuses() {
        let invalid: ApiError = AllocationError::InvalidFormat("ab".into()).into();
        let taken: ApiError = AllocationError::CodeTaken("taken".into()).into();
        let exhausted: ApiError = AllocationError::AllocationExhausted { attempts: 10 }.into();
        let storage: ApiError = AllocationError::Storage(StoreError::Database("down".into())).into();

        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(taken.status(), StatusCode::CONFLICT);
        assert_eq!(exhausted.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err: ApiError = StoreError::Database("disk on fire".into()).into();
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn resolution_reasons() {
        assert_eq!(ResolutionError::NotFound.reason(), "not-found");
        assert_eq!(ResolutionError::Expired.reason(), "expired");
        assert_eq!(
            ResolutionError::ServerError(StoreError::Database("x".into())).reason(),
            "server-error"
        );
    }
}
