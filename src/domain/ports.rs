use super::gateway::{classify_error, AuthorizationRequest, GatewayError, OperationId};
use super::payment::{Payment, PaymentId, ResponseCode};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable ledger of payments.
///
/// The store is the only component that assigns ids and timestamps.
/// `NotFound` and `NoPayments` are distinct errors; an empty list is never a success.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new record and returns it with `id`, `created_at` and `updated_at` set.
    async fn add(&self, payment: &Payment) -> Result<Payment>;
    /// Persists `status`, `code` and `operation_id` of an existing record.
    async fn update_status(&self, payment: &Payment) -> Result<Payment>;
    async fn get_by_id(&self, id: PaymentId) -> Result<Payment>;
    async fn list_by_customer(&self, customer_id: u64) -> Result<Vec<Payment>>;
    async fn list_all(&self) -> Result<Vec<Payment>>;
}

/// Outbound calls to the external authorization service.
#[async_trait]
pub trait BankGateway: Send + Sync {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> std::result::Result<OperationId, GatewayError>;
    async fn reverse(&self, operation_id: &OperationId) -> std::result::Result<(), GatewayError>;
    async fn refund(&self, operation_id: &OperationId) -> std::result::Result<(), GatewayError>;

    fn classify_error(&self, error: &GatewayError) -> ResponseCode {
        classify_error(error)
    }
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type BankGatewayRef = Arc<dyn BankGateway>;
