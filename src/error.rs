use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Единый тип ошибок для всех обработчиков.
///
/// Everything user-facing maps to `{"success": false, "error": ...}` with a
/// suitable status code; infrastructure failures are logged in full and
/// surfaced as a generic retryable message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Movie not found")]
    MovieNotFound,

    #[error("Showtime not found")]
    ShowtimeNotFound,

    #[error("Cart not found or expired")]
    CartNotFound,

    #[error("Cart belongs to a different showtime, please reselect your seats")]
    CartShowtimeMismatch,

    #[error("Maximum {0} seats per order")]
    SeatLimitReached(usize),

    #[error("Seat {0} is already booked")]
    SeatUnavailable(String),

    #[error("Unknown seat {0} for this showtime")]
    UnknownSeat(String),

    #[error("Seats already booked: {}", .0.join(", "))]
    SeatsConflict(Vec<String>),

    #[error("Seat rows missing for this showtime: {}", .0.join(", "))]
    SeatRowsMissing(Vec<String>),

    #[error("Extra not found or inactive: {0}")]
    ExtraNotFound(i64),

    #[error("Total mismatch: expected {expected:.2}")]
    TotalMismatch { expected: f64 },

    #[error("Seat was changed by someone else, reload and try again")]
    ToggleConflict,

    #[error("Sale not found")]
    SaleNotFound,

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Cart store error")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MovieNotFound
            | Self::ShowtimeNotFound
            | Self::CartNotFound
            | Self::CartShowtimeMismatch
            | Self::SaleNotFound
            | Self::ExtraNotFound(_)
            | Self::UnknownSeat(_) => StatusCode::NOT_FOUND,
            Self::SeatLimitReached(_)
            | Self::SeatUnavailable(_)
            | Self::SeatsConflict(_)
            | Self::ToggleConflict => StatusCode::CONFLICT,
            Self::TotalMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SeatRowsMissing(_)
            | Self::Database(_)
            | Self::Redis(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Текст для клиента: внутренние детали не отдаем наружу
    fn user_message(&self) -> String {
        match self {
            Self::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "Service temporarily unavailable. Please try again.".to_string()
            }
            Self::Redis(e) => {
                tracing::error!("cart store error: {:?}", e);
                "Service temporarily unavailable. Please try again.".to_string()
            }
            Self::Serialization(e) => {
                tracing::error!("serialization error: {:?}", e);
                "Service temporarily unavailable. Please try again.".to_string()
            }
            Self::SeatRowsMissing(labels) => {
                tracing::error!("seat rows missing at booking time: {:?}", labels);
                "Booking failed due to a seating data problem. Please contact staff.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "error": self.user_message(),
        });

        // Конфликтные места отдаем списком, чтобы киоск мог их подсветить
        match &self {
            AppError::SeatsConflict(labels) => {
                body["conflicting_seats"] = json!(labels);
            }
            AppError::TotalMismatch { expected } => {
                body["expected_total"] = json!(expected);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(
            AppError::SeatsConflict(vec!["A1".into()]).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::ToggleConflict.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::SeatLimitReached(8).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn infrastructure_errors_hide_detail() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("PoolTimedOut"));
    }

    #[test]
    fn conflict_message_lists_seats() {
        let err = AppError::SeatsConflict(vec!["A1".into(), "B2".into()]);
        assert_eq!(err.user_message(), "Seats already booked: A1, B2");
    }
}
