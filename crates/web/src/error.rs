use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use control::ControlError;
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Control(ControlError),
    Validation(ValidationErrors),
    Unauthorized,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control(e) => write!(f, "{}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Control(ControlError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Control(ControlError::RuleViolation(_)) => StatusCode::CONFLICT,
            Self::Control(ControlError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Control(ControlError::Storage(StorageError::ConstraintViolation(_))) => {
                StatusCode::CONFLICT
            }
            Self::Control(ControlError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            Self::Control(ControlError::Storage(StorageError::ConstraintViolation(msg))) => {
                json!({
                    "error": msg
                })
            }
            Self::Control(ControlError::Storage(e)) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Control(e) => {
                json!({
                    "error": e.to_string()
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::Unauthorized => {
                json!({
                    "error": "Unauthorized"
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<ControlError> for WebError {
    fn from(error: ControlError) -> Self {
        Self::Control(error)
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Control(ControlError::from(error))
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_errors_map_to_status_codes() {
        let cases = [
            (ControlError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ControlError::RuleViolation("x".into()), StatusCode::CONFLICT),
            (ControlError::NotFound("Attempt".into()), StatusCode::NOT_FOUND),
            (
                ControlError::Storage(StorageError::ConstraintViolation("dup".into())),
                StatusCode::CONFLICT,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(WebError::from(error).status_code(), expected);
        }
    }

    #[test]
    fn test_storage_not_found_is_404() {
        assert_eq!(
            WebError::from(StorageError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
