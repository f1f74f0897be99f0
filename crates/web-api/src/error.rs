use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, RepositoryError};

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::SenderNotFound) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "SENDER_NOT_FOUND",
                "Sender does not exist.",
            ),
            AppErr::Domain(DomainError::UserAlreadyExists) => {
                ApiError::new(StatusCode::CONFLICT, "USER_EXISTS", "user already exists")
            }
            AppErr::Domain(DomainError::EmailAlreadyInUse) => ApiError::new(
                StatusCode::CONFLICT,
                "EMAIL_IN_USE",
                "Email already in use.",
            ),
            AppErr::Domain(DomainError::UserNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "user not found")
            }
            AppErr::Domain(DomainError::ChatNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "CHAT_NOT_FOUND", "chat not found")
            }
            AppErr::Domain(err @ DomainError::InvalidSessionTransition { .. }) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            AppErr::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Storage { message } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    format!("storage error: {}", message),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DomainError, RepositoryError};

    #[test]
    fn maps_application_errors_to_status_codes() {
        let cases = [
            (
                ApplicationError::Domain(DomainError::invalid_argument("name", "cannot be empty")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::Domain(DomainError::SenderNotFound),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::Domain(DomainError::ChatNotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                ApplicationError::Domain(DomainError::UserAlreadyExists),
                StatusCode::CONFLICT,
            ),
            (
                ApplicationError::Domain(DomainError::EmailAlreadyInUse),
                StatusCode::CONFLICT,
            ),
            (
                ApplicationError::Repository(RepositoryError::storage("io")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }
}
