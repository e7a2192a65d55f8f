use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Ledger {
    last_id: PaymentId,
    payments: BTreeMap<PaymentId, Payment>,
}

/// A thread-safe in-memory payment ledger.
///
/// Uses `Arc<RwLock<..>>` so clones share the same records. Ids are assigned
/// sequentially from 1 and listings come back in id order.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn add(&self, payment: &Payment) -> Result<Payment> {
        let mut ledger = self.ledger.write().await;
        ledger.last_id += 1;

        let now = Utc::now();
        let mut stored = payment.clone();
        stored.id = Some(ledger.last_id);
        stored.created_at = Some(now);
        stored.updated_at = Some(now);

        let id = ledger.last_id;
        ledger.payments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_status(&self, payment: &Payment) -> Result<Payment> {
        let id = payment
            .id
            .ok_or_else(|| PaymentError::NotFound("payment has not been stored".to_string()))?;

        let mut ledger = self.ledger.write().await;
        let stored = ledger
            .payments
            .get_mut(&id)
            .ok_or_else(|| PaymentError::NotFound(format!("payment {id}")))?;

        stored.status = payment.status;
        stored.code = payment.code;
        stored.operation_id = payment.operation_id.clone();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn get_by_id(&self, id: PaymentId) -> Result<Payment> {
        let ledger = self.ledger.read().await;
        ledger
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("payment {id}")))
    }

    async fn list_by_customer(&self, customer_id: u64) -> Result<Vec<Payment>> {
        let ledger = self.ledger.read().await;
        let payments: Vec<Payment> = ledger
            .payments
            .values()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect();

        if payments.is_empty() {
            return Err(PaymentError::NoPayments(format!("customer {customer_id}")));
        }
        Ok(payments)
    }

    async fn list_all(&self) -> Result<Vec<Payment>> {
        let ledger = self.ledger.read().await;
        if ledger.payments.is_empty() {
            return Err(PaymentError::NoPayments("ledger is empty".to_string()));
        }
        Ok(ledger.payments.values().cloned().collect())
    }
}
