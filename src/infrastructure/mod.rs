//! Adapters implementing the domain ports.

pub mod bank_gateway;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod simulated_bank;
