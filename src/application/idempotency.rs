use moka::future::Cache;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Opaque client token identifying one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Uses the client's key when present, otherwise a fresh single-use one.
    pub fn from_client(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some(key) if !key.is_empty() => Self(key.to_string()),
            _ => Self::generate(),
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    New,
    Duplicate,
}

/// Time-bounded set of recently seen idempotency keys.
///
/// Cloning is cheap and every clone shares the same entries. Entries leave
/// only by expiring `ttl` after insertion; seeing a key again does not extend
/// its life. There is no size bound, so memory grows with requests per window.
#[derive(Clone)]
pub struct IdempotencyCache {
    inner: Cache<String, ()>,
}

impl IdempotencyCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder().time_to_live(ttl).build();
        Self { inner }
    }

    /// Records `key` if unseen. Exactly one concurrent caller observes `New`.
    pub async fn check_and_reserve(&self, key: &IdempotencyKey) -> Reservation {
        let entry = self.inner.entry_by_ref(key.as_str()).or_insert(()).await;
        if entry.is_fresh() {
            Reservation::New
        } else {
            Reservation::Duplicate
        }
    }
}

impl Default for IdempotencyCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}
