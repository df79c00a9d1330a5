use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend is not configured")]
    NotConfigured,

    #[error("{0}")]
    BadRequest(String),

    #[error("Permission denied by storage backend")]
    PermissionDenied,

    #[error("Not found")]
    NotFound,

    #[error("Authentication with storage backend failed")]
    AuthFailed,

    #[error("Storage backend error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Classify a non-success HTTP response from a remote store.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => StorageError::AuthFailed,
            reqwest::StatusCode::FORBIDDEN => StorageError::PermissionDenied,
            reqwest::StatusCode::NOT_FOUND => StorageError::NotFound,
            s if s.is_client_error() => StorageError::BadRequest(body.to_string()),
            s => StorageError::Unknown(format!("{}: {}", s, body)),
        }
    }

    /// True when the caller, not the backend, is at fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, StorageError::BadRequest(_) | StorageError::NotFound)
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        StorageError::Unknown(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn classifies_remote_statuses() {
        assert!(matches!(
            StorageError::from_status(StatusCode::UNAUTHORIZED, ""),
            StorageError::AuthFailed
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::FORBIDDEN, ""),
            StorageError::PermissionDenied
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::NOT_FOUND, ""),
            StorageError::NotFound
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad row"),
            StorageError::BadRequest(_)
        ));
        assert!(matches!(
            StorageError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            StorageError::Unknown(_)
        ));
    }
}
