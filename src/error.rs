use crate::domain::gateway::GatewayError;
use crate::domain::outcome::StatusCode;
use crate::domain::payment::PaymentStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No payments found: {0}")]
    NoPayments(String),
    #[error("cannot refund an unapproved payment (status: {0})")]
    RefundNotAllowed(PaymentStatus),
    #[error("request might be duplicated (idempotency key {0})")]
    DuplicateRequest(String),
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Cancelled while {0}")]
    Cancelled(&'static str),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaymentError {
    /// The status the edge layer reports for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            PaymentError::Validation(_) | PaymentError::RefundNotAllowed(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::NotFound(_) | PaymentError::NoPayments(_) => StatusCode::NOT_FOUND,
            PaymentError::DuplicateRequest(_) => StatusCode::CONFLICT,
            PaymentError::Cancelled(_) => StatusCode::REQUEST_TIMEOUT,
            PaymentError::Gateway(err) => err.status(),
            PaymentError::Storage(_)
            | PaymentError::Internal(_)
            | PaymentError::Csv(_)
            | PaymentError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client errors never trigger compensation and are safe to retry with a new key.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        PaymentError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PaymentError::Validation("amount".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaymentError::RefundNotAllowed(PaymentStatus::Rejected).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaymentError::NoPayments("customer 1".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PaymentError::DuplicateRequest("k".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            PaymentError::Storage("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PaymentError::Gateway(GatewayError::Transport("refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_refund_message() {
        let err = PaymentError::RefundNotAllowed(PaymentStatus::Reversed);
        assert_eq!(
            err.to_string(),
            "cannot refund an unapproved payment (status: reversed)"
        );
        assert!(err.is_client_error());
    }
}
