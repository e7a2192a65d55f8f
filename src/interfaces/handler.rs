use crate::application::idempotency::{IdempotencyCache, IdempotencyKey, Reservation};
use crate::application::orchestrator::PaymentOrchestrator;
use crate::domain::outcome::Outcome;
use crate::domain::payment::Payment;
use crate::error::{PaymentError, Result};
use crate::interfaces::csv::command_reader::{Command, CommandRecord};
use log::{debug, warn};
use std::time::Duration;
use tokio::time::Instant;

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Payment(Payment),
    Payments(Vec<Payment>),
}

/// The edge in front of the orchestrator: deduplicates, validates, dispatches.
#[derive(Clone)]
pub struct CommandHandler {
    orchestrator: PaymentOrchestrator,
    idempotency: IdempotencyCache,
    request_timeout: Option<Duration>,
}

impl CommandHandler {
    pub fn new(orchestrator: PaymentOrchestrator, idempotency: IdempotencyCache) -> Self {
        Self {
            orchestrator,
            idempotency,
            request_timeout: None,
        }
    }

    /// Bounds every Pay and Refund saga by `timeout`, measured from when the
    /// command is dispatched.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn deadline(&self) -> Option<Instant> {
        self.request_timeout.map(|t| Instant::now() + t)
    }

    /// Runs one raw CSV command. Rows without a key get a fresh one.
    pub async fn handle(&self, record: CommandRecord) -> Result<Outcome<Payload>> {
        let key = IdempotencyKey::from_client(record.key.as_deref());
        if self.idempotency.check_and_reserve(&key).await == Reservation::Duplicate {
            warn!("Rejecting duplicate request with idempotency key {}", key);
            return Err(PaymentError::DuplicateRequest(key.to_string()));
        }

        let command = Command::try_from(record)?;
        self.dispatch(command).await
    }

    pub async fn dispatch(&self, command: Command) -> Result<Outcome<Payload>> {
        debug!("Dispatching {} command", command.name());
        match command {
            Command::Pay { caller, request } => {
                let outcome = self.orchestrator.pay(caller, request, self.deadline()).await?;
                Ok(outcome.map(Payload::Payment))
            }
            Command::Refund { payment } => Ok(self
                .orchestrator
                .refund_payment(payment, self.deadline())
                .await?
                .map(Payload::Payment)),
            Command::Get { payment } => Ok(self
                .orchestrator
                .get_payment_by_id(payment)
                .await?
                .map(Payload::Payment)),
            Command::Customer { customer } => Ok(self
                .orchestrator
                .get_customer_payments(customer)
                .await?
                .map(Payload::Payments)),
            Command::List => Ok(self
                .orchestrator
                .get_all_payments()
                .await?
                .map(Payload::Payments)),
        }
    }

    /// The whole ledger, empty when nothing was recorded.
    pub async fn ledger(&self) -> Result<Vec<Payment>> {
        match self.orchestrator.get_all_payments().await {
            Ok(outcome) => Ok(outcome.payload),
            Err(PaymentError::NoPayments(_)) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}
