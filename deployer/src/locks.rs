//! Per-domain serialization
//!
//! The site directory, the proxy daemon's active configuration and the
//! certificate store are shared resources keyed by domain. Operations on
//! the same canonical domain must not interleave — a validate-then-reload
//! from one operation can race another's file write — so every pipeline
//! entry point acquires the domain's lock first. Different domains proceed
//! concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-domain async locks
#[derive(Default)]
pub struct DomainLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DomainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a canonical domain, waiting if another
    /// operation on the same domain is in flight
    pub async fn acquire(&self, canonical_domain: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(canonical_domain.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
