use axum::http::StatusCode;
use chrono::NaiveDate;
use thiserror::Error;

/// Failures of store operations that the browser version silently ignored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("member {0} not found")]
    MemberNotFound(String),
    #[error("invalid attendance status '{0}', expected Present, Absent or Leave")]
    InvalidStatus(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("date range starts at {from} after it ends at {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
    #[error("date range {from} to {to} is longer than {max_days} days")]
    DateRangeTooLong { from: NaiveDate, to: NaiveDate, max_days: i64 },
}

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

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
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

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MemberNotFound(_) => Self::not_found(err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
