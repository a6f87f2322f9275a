use storage::error::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ControlError>;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rule violation: {0}")]
    RuleViolation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ControlError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound => Self::NotFound("Record".to_string()),
            StorageError::InvalidValue(msg) => Self::InvalidInput(msg),
            other => Self::Storage(other),
        }
    }
}

/// Names the missing record when a store lookup comes back empty.
pub(crate) trait NotFoundExt<T> {
    fn or_not_found(self, kind: &str, id: uuid::Uuid) -> Result<T>;
}

impl<T> NotFoundExt<T> for storage::error::Result<T> {
    fn or_not_found(self, kind: &str, id: uuid::Uuid) -> Result<T> {
        self.map_err(|e| match e {
            StorageError::NotFound => ControlError::NotFound(format!("{} {}", kind, id)),
            other => ControlError::from(other),
        })
    }
}
