use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// One violated field constraint, reported alongside every other violation
/// instead of short-circuiting on the first.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid booking ID format")]
    InvalidIdFormat,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Search term is required")]
    SearchTermRequired,

    #[error("{0}")]
    InvalidFilterValue(String),

    #[error("{0}")]
    InvalidDateFormat(String),

    #[error("{0}")]
    InvalidPriceRange(String),

    #[error("{0}")]
    InvalidPagination(String),

    #[error("{0}")]
    InvalidSortField(String),

    #[error("{0}")]
    InvalidSortOrder(String),

    #[error("Rating must be an integer between 1 and 5")]
    InvalidRating,

    #[error("Only completed bookings can be rated")]
    BookingNotCompleted,

    #[error("{message}")]
    Internal {
        code: &'static str,
        message: &'static str,
    },
}

impl ApiError {
    /// Wrap an unexpected failure with an operation-specific code. The
    /// underlying error is logged, never surfaced to the caller.
    pub fn internal(code: &'static str, message: &'static str, err: anyhow::Error) -> Self {
        tracing::error!("{code}: {err:#}");
        ApiError::Internal { code, message }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidIdFormat => "INVALID_ID_FORMAT",
            ApiError::BookingNotFound => "BOOKING_NOT_FOUND",
            ApiError::SearchTermRequired => "SEARCH_TERM_REQUIRED",
            ApiError::InvalidFilterValue(_) => "INVALID_FILTER_VALUE",
            ApiError::InvalidDateFormat(_) => "INVALID_DATE_FORMAT",
            ApiError::InvalidPriceRange(_) => "INVALID_PRICE_RANGE",
            ApiError::InvalidPagination(_) => "INVALID_PAGINATION",
            ApiError::InvalidSortField(_) => "INVALID_SORT_FIELD",
            ApiError::InvalidSortOrder(_) => "INVALID_SORT_ORDER",
            ApiError::InvalidRating => "INVALID_RATING",
            ApiError::BookingNotCompleted => "BOOKING_NOT_COMPLETED",
            ApiError::Internal { code, .. } => code,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BookingNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// `axum::Json` with its rejections folded into the error envelope, so a
/// malformed, mistyped, or wrongly content-typed body never surfaces as a
/// plain-text response.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::Validation(vec![FieldError::new(
                "body",
                rejection.body_text(),
            )])),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = serde_json::json!({
            "message": self.to_string(),
            "code": self.code(),
        });
        if let ApiError::Validation(details) = &self {
            error["details"] = serde_json::json!(details);
        }

        let body = serde_json::json!({ "success": false, "error": error });
        (self.status(), axum::Json(body)).into_response()
    }
}
