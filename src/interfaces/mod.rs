//! Edge adapters: CSV command batches in, ledger CSV out.

pub mod csv;
pub mod handler;
