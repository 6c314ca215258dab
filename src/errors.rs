use crate::journal::JournalError;
use crate::storage::StorageError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn insufficient_storage(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INSUFFICIENT_STORAGE,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded { .. } => Self::insufficient_storage(err.to_string()),
            other => Self::internal(other),
        }
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Storage(inner) => inner.into(),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_maps_to_insufficient_storage() {
        let err: AppError = JournalError::Storage(StorageError::QuotaExceeded {
            needed: 10,
            quota: 5,
        })
        .into();
        assert_eq!(err.status, StatusCode::INSUFFICIENT_STORAGE);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err: AppError = JournalError::InvalidMood(9).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains('9'));
    }
}
