use crate::domain::outcome::StatusCode;
use crate::domain::payment::{PaymentRequest, ResponseCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The bank's identifier for an authorized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST {base}/pay`. The bank reads `amount` as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "merchantID")]
    pub merchant_id: u64,
    #[serde(rename = "bankID")]
    pub bank_id: u64,
}

impl From<&PaymentRequest> for AuthorizationRequest {
    fn from(request: &PaymentRequest) -> Self {
        Self {
            amount: request.amount.value(),
            merchant_id: request.merchant_id,
            bank_id: request.bank_id,
        }
    }
}

/// Body the bank answers a successful authorization with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(rename = "operationID")]
    pub operation_id: OperationId,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The bank answered with a non-2xx status.
    #[error("bank refused the operation ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Timeouts, refused connections and unreadable responses.
    #[error("bank unreachable: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Rejected { status, .. } => StatusCode::from_u16(*status),
            GatewayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn decline_reason(&self) -> Option<DeclineReason> {
        match self {
            GatewayError::Rejected { message, .. } => DeclineReason::from_message(message),
            GatewayError::Transport(_) => None,
        }
    }
}

/// Business-rule failures the bank reports by message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    InvalidCardHash,
    InsufficientBalance,
    LimitExceeded,
}

impl DeclineReason {
    pub const ALL: [DeclineReason; 3] = [
        DeclineReason::InvalidCardHash,
        DeclineReason::InsufficientBalance,
        DeclineReason::LimitExceeded,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            DeclineReason::InvalidCardHash => "invalid card hash",
            DeclineReason::InsufficientBalance => "client has insufficient balance",
            DeclineReason::LimitExceeded => "client has exceeded the limit",
        }
    }

    pub fn from_message(message: &str) -> Option<Self> {
        let message = message.trim();
        Self::ALL
            .into_iter()
            .find(|reason| reason.message().eq_ignore_ascii_case(message))
    }

    pub fn code(&self) -> ResponseCode {
        match self {
            DeclineReason::InvalidCardHash => ResponseCode::INVALID_CARD_HASH,
            DeclineReason::InsufficientBalance => ResponseCode::INSUFFICIENT_BALANCE,
            DeclineReason::LimitExceeded => ResponseCode::LIMIT_EXCEEDED,
        }
    }
}

/// Maps any gateway failure to the response code stored on a rejected payment.
pub fn classify_error(error: &GatewayError) -> ResponseCode {
    error
        .decline_reason()
        .map(|reason| reason.code())
        .unwrap_or(ResponseCode::UNKNOWN)
}
