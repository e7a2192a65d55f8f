use crate::domain::gateway::{AuthorizationRequest, OperationId};
use crate::domain::outcome::Outcome;
use crate::domain::payment::{CallerIdentity, Payment, PaymentId, PaymentRequest, PaymentStatus};
use crate::domain::ports::{BankGatewayRef, PaymentStoreRef};
use crate::error::{PaymentError, Result};
use log::{error, info, warn};
use std::future::Future;
use tokio::time::Instant;

/// Drives the Pay and Refund sagas across the bank gateway and the local store.
///
/// `PaymentOrchestrator` is the only component that decides payment status
/// transitions. It owns no state of its own; clones share the same gateway
/// and store, so one instance can serve any number of concurrent requests.
///
/// Gateway authorization always precedes local persistence, which always
/// precedes compensation. When persistence fails after the bank approved the
/// funds, one reversal is attempted and never retried.
#[derive(Clone)]
pub struct PaymentOrchestrator {
    gateway: BankGatewayRef,
    store: PaymentStoreRef,
}

impl PaymentOrchestrator {
    /// Creates a new `PaymentOrchestrator`.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The external bank authorizing, reversing and refunding payments.
    /// * `store` - The local payment ledger.
    pub fn new(gateway: BankGatewayRef, store: PaymentStoreRef) -> Self {
        Self { gateway, store }
    }

    /// Executes the Pay saga.
    ///
    /// A bank decline is a valid business result and comes back as a
    /// `201 Created` rejected payment. A failure to persist an approved
    /// payment triggers a compensating reversal and returns the store error.
    ///
    /// `deadline` bounds the authorize and persist calls. The saga body runs
    /// on its own task, so dropping the returned future never interrupts a
    /// compensation in flight.
    pub async fn pay(
        &self,
        caller: CallerIdentity,
        request: PaymentRequest,
        deadline: Option<Instant>,
    ) -> Result<Outcome<Payment>> {
        let saga = self.clone();
        tokio::spawn(async move { saga.run_pay(caller, request, deadline).await })
            .await
            .map_err(|e| PaymentError::Internal(format!("payment saga aborted: {e}")))?
    }

    async fn run_pay(
        &self,
        caller: CallerIdentity,
        request: PaymentRequest,
        deadline: Option<Instant>,
    ) -> Result<Outcome<Payment>> {
        let mut payment = Payment::provisional(caller, &request);
        let authorization = AuthorizationRequest::from(&request);

        let operation_id = match within(deadline, self.gateway.authorize(&authorization)).await {
            None => {
                warn!(
                    "Payment for customer {} cancelled before the bank answered",
                    caller.customer_id
                );
                return Err(PaymentError::Cancelled("authorizing the payment"));
            }
            Some(Err(err)) => {
                let code = self.gateway.classify_error(&err);
                info!(
                    "Bank rejected payment for customer {} with code {}: {}",
                    caller.customer_id, code, err
                );
                payment.reject(code)?;
                return Ok(Outcome::created(self.record_rejection(payment, deadline).await));
            }
            Some(Ok(operation_id)) => operation_id,
        };

        payment.authorize(operation_id.clone());

        match within(deadline, self.store.add(&payment)).await {
            Some(Ok(stored)) => {
                info!(
                    "Payment {:?} approved with operation {}",
                    stored.id, operation_id
                );
                Ok(Outcome::created(stored))
            }
            Some(Err(err)) => {
                error!(
                    "Storing approved operation {} failed: {}",
                    operation_id, err
                );
                self.compensate(&mut payment, &operation_id).await;
                Err(err)
            }
            None => {
                warn!(
                    "Payment with operation {} cancelled before it was stored",
                    operation_id
                );
                self.compensate(&mut payment, &operation_id).await;
                Err(PaymentError::Cancelled("storing the payment"))
            }
        }
    }

    /// Rejections are stored for the record, but a storage failure does not
    /// change the answer: nothing was committed at the bank.
    async fn record_rejection(&self, payment: Payment, deadline: Option<Instant>) -> Payment {
        match within(deadline, self.store.add(&payment)).await {
            Some(Ok(stored)) => stored,
            Some(Err(err)) => {
                warn!("Could not store rejected payment: {}", err);
                payment
            }
            None => {
                warn!("Storing rejected payment was cancelled");
                payment
            }
        }
    }

    /// Best-effort reversal of an approved operation whose local commit failed.
    ///
    /// Neither the reversal nor the status update is retried; their failures
    /// are logged and never replace the error the caller receives.
    async fn compensate(&self, payment: &mut Payment, operation_id: &OperationId) {
        if payment.status != PaymentStatus::Approved {
            return;
        }
        warn!("Reversing operation {} at the bank", operation_id);

        if let Err(err) = self.gateway.reverse(operation_id).await {
            error!("Error reversing operation {}: {}", operation_id, err);
        }

        if let Err(err) = payment.mark_reversed() {
            error!("Error marking operation {} reversed: {}", operation_id, err);
            return;
        }

        if let Err(err) = self.store.update_status(payment).await {
            error!(
                "Error changing status of operation {} to {}: {}",
                operation_id, payment.status, err
            );
        }
    }

    pub async fn get_payment_by_id(&self, id: PaymentId) -> Result<Outcome<Payment>> {
        Ok(Outcome::ok(self.store.get_by_id(id).await?))
    }

    pub async fn get_customer_payments(&self, customer_id: u64) -> Result<Outcome<Vec<Payment>>> {
        Ok(Outcome::ok(self.store.list_by_customer(customer_id).await?))
    }

    pub async fn get_all_payments(&self) -> Result<Outcome<Vec<Payment>>> {
        Ok(Outcome::ok(self.store.list_all().await?))
    }

    /// Executes the Refund saga. Only approved payments can be refunded.
    ///
    /// If the bank refunds but the local status update fails, the divergence
    /// is logged and the store error returned; the bank offers no way to undo
    /// a refund.
    ///
    /// `deadline` bounds the bank call. When it passes first the payment stays
    /// `Approved` locally and `Cancelled` is returned.
    pub async fn refund_payment(
        &self,
        id: PaymentId,
        deadline: Option<Instant>,
    ) -> Result<Outcome<Payment>> {
        let mut payment = self.store.get_by_id(id).await?;

        if payment.status != PaymentStatus::Approved {
            return Err(PaymentError::RefundNotAllowed(payment.status));
        }

        let operation_id = payment.operation_id.clone().ok_or_else(|| {
            PaymentError::Internal(format!("approved payment {id} has no bank operation"))
        })?;

        match within(deadline, self.gateway.refund(&operation_id)).await {
            Some(result) => result?,
            None => {
                warn!(
                    "Refund of payment {} (operation {}) cancelled before the bank answered",
                    id, operation_id
                );
                return Err(PaymentError::Cancelled("refunding the payment"));
            }
        }

        payment.mark_refunded()?;
        let updated = self.store.update_status(&payment).await.map_err(|err| {
            error!(
                "Payment {} refunded at the bank (operation {}) but not locally: {}",
                id, operation_id, err
            );
            err
        })?;

        info!("Payment {} refunded", id);
        Ok(Outcome::ok(updated))
    }
}

/// Awaits `fut`, giving up at `deadline`. `None` means the deadline won.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_within_without_deadline_waits() {
        let value = within(None, async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            7
        })
        .await;
        assert_eq!(value, Some(7));
    }

    #[tokio::test]
    async fn test_within_gives_up_at_deadline() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let value = within(Some(deadline), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            7
        })
        .await;
        assert_eq!(value, None);
    }
}
