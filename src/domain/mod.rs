//! Domain layer: the payment record, its state machine, and the ports the
//! orchestrator drives.

pub mod gateway;
pub mod outcome;
pub mod payment;
pub mod ports;
