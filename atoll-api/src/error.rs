use atoll_order::checkout::CheckoutError;
use atoll_order::lookup::LookupError;
use atoll_order::manager::ManagerError;
use atoll_order::orchestrator::PaymentError;
use atoll_order::saved::SavedError;
use atoll_order::{DraftError, RosterError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Authentication(String),
    Authorization(String),
    Validation { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    Conflict { code: &'static str, message: String },
    PaymentRequired { code: &'static str, message: String },
    BadGateway { code: &'static str, message: String },
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            AppError::Validation { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::PaymentRequired { code, message } => {
                (StatusCode::PAYMENT_REQUIRED, code, message)
            }
            AppError::BadGateway { code, message } => {
                tracing::error!("Upstream failure [{}]: {}", code, message);
                (StatusCode::BAD_GATEWAY, code, message)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        let code = err.code();
        match err {
            RosterError::UnknownPassenger(_) => AppError::NotFound {
                code,
                message: err.to_string(),
            },
            _ => AppError::Validation {
                code,
                message: err.to_string(),
            },
        }
    }
}

impl From<DraftError> for AppError {
    fn from(err: DraftError) -> Self {
        let code = err.code();
        match err {
            DraftError::Roster(inner) => inner.into(),
            DraftError::StageNotReached { .. } | DraftError::AlreadyConfirmed => AppError::Conflict {
                code,
                message: err.to_string(),
            },
            _ => AppError::Validation {
                code,
                message: err.to_string(),
            },
        }
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::NotFound(_) => AppError::NotFound {
                code: "draft_not_found",
                message: err.to_string(),
            },
            ManagerError::Draft(inner) => inner.into(),
            ManagerError::Storage(_) | ManagerError::Corrupt(..) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            PaymentError::NonPositiveAmount => AppError::Validation { code, message },
            PaymentError::MissingTransactionId
            | PaymentError::MissingRedirectUrl
            | PaymentError::Gateway(_) => AppError::BadGateway { code, message },
            PaymentError::NoPendingTransaction
            | PaymentError::StageNotReached
            | PaymentError::AlreadyPaid => AppError::Conflict { code, message },
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Manager(inner) => inner.into(),
            CheckoutError::Payment(inner) => inner.into(),
            CheckoutError::NotConfirmed(_) => AppError::PaymentRequired {
                code: "payment_not_confirmed",
                message: err.to_string(),
            },
            CheckoutError::AlreadyConfirmed => AppError::Conflict {
                code: "already_confirmed",
                message: err.to_string(),
            },
        }
    }
}

impl From<SavedError> for AppError {
    fn from(err: SavedError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        let message = err.to_string();
        match err {
            LookupError::InvalidEmail(_) => AppError::Validation {
                code: "invalid_email",
                message,
            },
            LookupError::InvalidCode => AppError::Validation {
                code: "invalid_code",
                message,
            },
            LookupError::InvalidReference(_) => AppError::Validation {
                code: "invalid_reference",
                message,
            },
            LookupError::Rejected(_) => AppError::Authentication(message),
            LookupError::Service(_) => AppError::BadGateway {
                code: "lookup_unavailable",
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        let err: AppError = err.into();
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(DraftError::InvalidBooking), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(DraftError::TooManyPassengers { max: 15 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DraftError::AlreadyConfirmed), StatusCode::CONFLICT);
        assert_eq!(
            status_of(ManagerError::NotFound(uuid::Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(PaymentError::MissingRedirectUrl), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(CheckoutError::NotConfirmed("FAILED".into())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_of(RosterError::UnknownPassenger(9)),
            StatusCode::NOT_FOUND
        );
    }
}
