#![allow(dead_code)]

use async_trait::async_trait;
use payment_saga::domain::gateway::{AuthorizationRequest, GatewayError, OperationId};
use payment_saga::domain::payment::{Payment, PaymentId};
use payment_saga::domain::ports::{BankGateway, PaymentStore};
use payment_saga::error::{PaymentError, Result};
use payment_saga::infrastructure::in_memory::InMemoryPaymentStore;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A bank whose authorize answer is scripted and whose calls are recorded.
#[derive(Clone)]
pub struct RecordingGateway {
    authorize_result: std::result::Result<OperationId, GatewayError>,
    authorize_delay: Option<Duration>,
    refund_result: std::result::Result<(), GatewayError>,
    reverse_result: std::result::Result<(), GatewayError>,
    refund_delay: Option<Duration>,
    pub authorizations: Arc<Mutex<Vec<AuthorizationRequest>>>,
    pub reversals: Arc<Mutex<Vec<OperationId>>>,
    pub refunds: Arc<Mutex<Vec<OperationId>>>,
}

impl RecordingGateway {
    pub fn approving(operation_id: &str) -> Self {
        Self::with_result(Ok(OperationId::new(operation_id)))
    }

    pub fn declining(status: u16, message: &str) -> Self {
        Self::with_result(Err(GatewayError::rejected(status, message)))
    }

    pub fn unreachable() -> Self {
        Self::with_result(Err(GatewayError::Transport("connection refused".into())))
    }

    fn with_result(authorize_result: std::result::Result<OperationId, GatewayError>) -> Self {
        Self {
            authorize_result,
            authorize_delay: None,
            refund_result: Ok(()),
            reverse_result: Ok(()),
            refund_delay: None,
            authorizations: Arc::default(),
            reversals: Arc::default(),
            refunds: Arc::default(),
        }
    }

    pub fn with_authorize_delay(mut self, delay: Duration) -> Self {
        self.authorize_delay = Some(delay);
        self
    }

    pub fn failing_refunds(mut self, err: GatewayError) -> Self {
        self.refund_result = Err(err);
        self
    }

    pub fn failing_reversals(mut self, err: GatewayError) -> Self {
        self.reverse_result = Err(err);
        self
    }

    pub fn with_refund_delay(mut self, delay: Duration) -> Self {
        self.refund_delay = Some(delay);
        self
    }

    pub fn reversal_calls(&self) -> Vec<OperationId> {
        self.reversals.lock().unwrap().clone()
    }

    pub fn refund_calls(&self) -> Vec<OperationId> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl BankGateway for RecordingGateway {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> std::result::Result<OperationId, GatewayError> {
        self.authorizations.lock().unwrap().push(request.clone());
        if let Some(delay) = self.authorize_delay {
            tokio::time::sleep(delay).await;
        }
        self.authorize_result.clone()
    }

    async fn reverse(&self, operation_id: &OperationId) -> std::result::Result<(), GatewayError> {
        self.reversals.lock().unwrap().push(operation_id.clone());
        self.reverse_result.clone()
    }

    async fn refund(&self, operation_id: &OperationId) -> std::result::Result<(), GatewayError> {
        self.refunds.lock().unwrap().push(operation_id.clone());
        if let Some(delay) = self.refund_delay {
            tokio::time::sleep(delay).await;
        }
        self.refund_result.clone()
    }
}

/// Wraps the in-memory store with switchable failures and a log of status updates.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryPaymentStore,
    fail_add: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
    add_delay: Arc<Mutex<Option<Duration>>>,
    pub updates: Arc<Mutex<Vec<Payment>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn delay_add(&self, delay: Duration) {
        *self.add_delay.lock().unwrap() = Some(delay);
    }

    pub fn update_calls(&self) -> Vec<Payment> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentStore for FlakyStore {
    async fn add(&self, payment: &Payment) -> Result<Payment> {
        let delay = *self.add_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(PaymentError::Storage("disk full".into()));
        }
        self.inner.add(payment).await
    }

    async fn update_status(&self, payment: &Payment) -> Result<Payment> {
        self.updates.lock().unwrap().push(payment.clone());
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(PaymentError::Storage("update failed".into()));
        }
        self.inner.update_status(payment).await
    }

    async fn get_by_id(&self, id: PaymentId) -> Result<Payment> {
        self.inner.get_by_id(id).await
    }

    async fn list_by_customer(&self, customer_id: u64) -> Result<Vec<Payment>> {
        self.inner.list_by_customer(customer_id).await
    }

    async fn list_all(&self) -> Result<Vec<Payment>> {
        self.inner.list_all().await
    }
}

pub const COMMAND_HEADER: &str = "type, key, customer, merchant, bank, amount, payment";

/// Writes a command batch with the standard header.
pub fn write_commands(path: &Path, rows: &[&str]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{COMMAND_HEADER}")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    file.flush()
}
