use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payment records, keyed by big-endian id.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent payment ledger backed by RocksDB.
///
/// Ids continue from the highest stored id when an existing database is
/// reopened. Writes are serialized through `write_lock` so id assignment and
/// read-modify-write status updates never interleave.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbPaymentStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<PaymentId>>,
}

impl RocksDbPaymentStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments])?;

        let last_id = {
            let cf = payments_cf(&db)?;
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(item) => decode_key(&item?.0)?,
                None => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(last_id)),
        })
    }

    fn put(&self, payment: &Payment, id: PaymentId) -> Result<()> {
        let cf = payments_cf(&self.db)?;
        let value = serde_json::to_vec(payment)
            .map_err(|e| PaymentError::Storage(format!("Serialization error: {e}")))?;
        self.db.put_cf(cf, id.to_be_bytes(), value)?;
        Ok(())
    }

    fn read(&self, id: PaymentId) -> Result<Option<Payment>> {
        let cf = payments_cf(&self.db)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode_payment(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan(&self, mut keep: impl FnMut(&Payment) -> bool) -> Result<Vec<Payment>> {
        let cf = payments_cf(&self.db)?;
        let mut payments = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let payment = decode_payment(&value)?;
            if keep(&payment) {
                payments.push(payment);
            }
        }
        Ok(payments)
    }
}

fn payments_cf(db: &DB) -> Result<&ColumnFamily> {
    db.cf_handle(CF_PAYMENTS)
        .ok_or_else(|| PaymentError::Storage("Payments column family not found".to_string()))
}

fn decode_key(bytes: &[u8]) -> Result<PaymentId> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| PaymentError::Storage(format!("Malformed payment key {bytes:?}")))?;
    Ok(PaymentId::from_be_bytes(raw))
}

fn decode_payment(bytes: &[u8]) -> Result<Payment> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::Storage(format!("Deserialization error: {e}")))
}

#[async_trait]
impl PaymentStore for RocksDbPaymentStore {
    async fn add(&self, payment: &Payment) -> Result<Payment> {
        let mut last_id = self.write_lock.lock().await;
        let id = *last_id + 1;

        let now = Utc::now();
        let mut stored = payment.clone();
        stored.id = Some(id);
        stored.created_at = Some(now);
        stored.updated_at = Some(now);

        self.put(&stored, id)?;
        *last_id = id;
        Ok(stored)
    }

    async fn update_status(&self, payment: &Payment) -> Result<Payment> {
        let id = payment
            .id
            .ok_or_else(|| PaymentError::NotFound("payment has not been stored".to_string()))?;

        let _guard = self.write_lock.lock().await;
        let mut stored = self
            .read(id)?
            .ok_or_else(|| PaymentError::NotFound(format!("payment {id}")))?;

        stored.status = payment.status;
        stored.code = payment.code;
        stored.operation_id = payment.operation_id.clone();
        stored.updated_at = Some(Utc::now());

        self.put(&stored, id)?;
        Ok(stored)
    }

    async fn get_by_id(&self, id: PaymentId) -> Result<Payment> {
        self.read(id)?
            .ok_or_else(|| PaymentError::NotFound(format!("payment {id}")))
    }

    async fn list_by_customer(&self, customer_id: u64) -> Result<Vec<Payment>> {
        let payments = self.scan(|p| p.customer_id == customer_id)?;
        if payments.is_empty() {
            return Err(PaymentError::NoPayments(format!("customer {customer_id}")));
        }
        Ok(payments)
    }

    async fn list_all(&self) -> Result<Vec<Payment>> {
        let payments = self.scan(|_| true)?;
        if payments.is_empty() {
            return Err(PaymentError::NoPayments("ledger is empty".to_string()));
        }
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway::OperationId;
    use crate::domain::payment::{CallerIdentity, PaymentRequest, PaymentStatus};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn approved(customer: u64, op: &str) -> Payment {
        let request = PaymentRequest::new(dec!(100.00), 7, 2).unwrap();
        let mut payment = Payment::provisional(CallerIdentity::new(customer), &request);
        payment.authorize(OperationId::new(op));
        payment
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbPaymentStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_PAYMENTS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksDbPaymentStore::open(dir.path()).unwrap();

        let stored = store.add(&approved(1, "op-1")).await.unwrap();
        let retrieved = store.get_by_id(stored.id.unwrap()).await.unwrap();
        assert_eq!(retrieved, stored);
        assert_eq!(retrieved.status, PaymentStatus::Approved);
    }

    #[tokio::test]
    async fn test_rocksdb_ids_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbPaymentStore::open(dir.path()).unwrap();
            store.add(&approved(1, "op-1")).await.unwrap();
            store.add(&approved(1, "op-2")).await.unwrap();
        }

        let store = RocksDbPaymentStore::open(dir.path()).unwrap();
        let third = store.add(&approved(2, "op-3")).await.unwrap();
        assert_eq!(third.id, Some(3));
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }
}
