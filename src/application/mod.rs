//! Application layer containing the payment sagas.
//!
//! `PaymentOrchestrator` composes the bank gateway and the payment store and
//! owns the compensation policy. `IdempotencyCache` is the shared structure
//! the edge consults before handing a request to the orchestrator.

pub mod idempotency;
pub mod orchestrator;
