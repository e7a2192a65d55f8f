use crate::domain::gateway::OperationId;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Write};
use std::str::FromStr;

pub type PaymentId = u64;

/// Represents a positive monetary amount with 2 decimal places.
///
/// Inputs with more than 2 decimal places are refused rather than rounded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const SCALE: u32 = 2;

    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(PaymentError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PaymentError::Validation(format!(
                "Amount {value} has more than {} decimal places",
                Self::SCALE
            )));
        }
        let mut fixed = normalized;
        fixed.rescale(Self::SCALE);
        Ok(Self(fixed))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ISO-8583 style response code. Always 4 ASCII digits, compared as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseCode([u8; 4]);

impl ResponseCode {
    pub const APPROVED: Self = Self(*b"0000");
    pub const REFUNDED: Self = Self(*b"0008");
    pub const INVALID_CARD_HASH: Self = Self(*b"1011");
    pub const INSUFFICIENT_BALANCE: Self = Self(*b"1016");
    pub const LIMIT_EXCEEDED: Self = Self(*b"2011");
    pub const UNKNOWN: Self = Self(*b"9999");
}

impl FromStr for ResponseCode {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        match <[u8; 4]>::try_from(bytes) {
            Ok(code) if code.iter().all(u8::is_ascii_digit) => Ok(Self(code)),
            _ => Err(PaymentError::Validation(format!(
                "Response code must be 4 digits, got {s:?}"
            ))),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in self.0 {
            f.write_char(digit as char)?;
        }
        Ok(())
    }
}

impl Serialize for ResponseCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    /// Present in the ledger schema, never produced by the orchestrator.
    Cancelled,
    Rejected,
    Refunded,
    Reversed,
}

impl PaymentStatus {
    /// Whether the gateway accepted the attempt at some point.
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Approved | PaymentStatus::Reversed | PaymentStatus::Refunded
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Rejected
                | PaymentStatus::Reversed
                | PaymentStatus::Refunded
                | PaymentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        !self.is_terminal()
            && matches!(
                (self, next),
                (PaymentStatus::Approved, PaymentStatus::Reversed)
                    | (PaymentStatus::Approved, PaymentStatus::Refunded)
            )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Reversed => "reversed",
        };
        f.write_str(name)
    }
}

/// The authenticated customer on whose behalf a payment is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub customer_id: u64,
}

impl CallerIdentity {
    pub fn new(customer_id: u64) -> Self {
        Self { customer_id }
    }
}

/// A validated request to pay a merchant through a bank.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub merchant_id: u64,
    pub bank_id: u64,
}

impl PaymentRequest {
    pub fn new(amount: Decimal, merchant_id: u64, bank_id: u64) -> Result<Self> {
        if merchant_id == 0 {
            return Err(PaymentError::Validation(
                "merchant id must be set".to_string(),
            ));
        }
        if bank_id == 0 {
            return Err(PaymentError::Validation("bank id must be set".to_string()));
        }
        Ok(Self {
            amount: Amount::new(amount)?,
            merchant_id,
            bank_id,
        })
    }
}

/// The unit of record in the local ledger.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    /// Assigned by the store on creation.
    pub id: Option<PaymentId>,
    pub amount: Amount,
    pub customer_id: u64,
    pub merchant_id: u64,
    pub bank_id: u64,
    pub status: PaymentStatus,
    pub code: ResponseCode,
    /// Set iff the gateway authorized the payment.
    pub operation_id: Option<OperationId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Builds the optimistic record a Pay saga starts from.
    pub fn provisional(caller: CallerIdentity, request: &PaymentRequest) -> Self {
        Self {
            id: None,
            amount: request.amount,
            customer_id: caller.customer_id,
            merchant_id: request.merchant_id,
            bank_id: request.bank_id,
            status: PaymentStatus::Approved,
            code: ResponseCode::APPROVED,
            operation_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Turns a not-yet-authorized provisional record into a rejection.
    pub fn reject(&mut self, code: ResponseCode) -> Result<()> {
        if self.id.is_some() || self.operation_id.is_some() {
            return Err(PaymentError::Internal(format!(
                "payment {:?} was already authorized and cannot be rejected",
                self.id
            )));
        }
        self.status = PaymentStatus::Rejected;
        self.code = code;
        Ok(())
    }

    pub fn authorize(&mut self, operation_id: OperationId) {
        self.operation_id = Some(operation_id);
    }

    pub fn mark_reversed(&mut self) -> Result<()> {
        self.transition(PaymentStatus::Reversed)
    }

    pub fn mark_refunded(&mut self) -> Result<()> {
        if self.status != PaymentStatus::Approved {
            return Err(PaymentError::RefundNotAllowed(self.status));
        }
        self.transition(PaymentStatus::Refunded)?;
        self.code = ResponseCode::REFUNDED;
        Ok(())
    }

    /// `operation_id` is present iff the status says the gateway accepted the attempt.
    pub fn is_consistent(&self) -> bool {
        self.operation_id.is_some() == self.status.is_authorized()
    }

    fn transition(&mut self, next: PaymentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::Internal(format!(
                "invalid payment transition {} -> {}",
                self.status, next
            )));
        }
        if self.operation_id.is_none() {
            return Err(PaymentError::Internal(format!(
                "payment {:?} has no gateway operation to move to {}",
                self.id, next
            )));
        }
        self.status = next;
        Ok(())
    }
}
