//! Distributed lock service tests.
//!
//! Exercises the lease protocol over an in-memory lease store: acquisition,
//! contention, expiry stealing, owner-checked release, and release after a
//! failed action.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use firmdir_sync::{LeaseStore, LockError, LockService, StoreError};

/// Lease store over a plain map, mirroring the conditional-upsert protocol
/// of the database table.
#[derive(Debug, Default)]
struct InMemoryLeaseStore {
    leases: Mutex<HashMap<String, (Instant, String)>>,
}

impl InMemoryLeaseStore {
    fn holder(&self, key: &str) -> Option<String> {
        self.leases
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, owner)| owner.clone())
    }

    fn seed_lease(&self, key: &str, owner: &str, expires_in: Duration) {
        let expiry = if expires_in.is_zero() {
            Instant::now() - Duration::from_secs(1)
        } else {
            Instant::now() + expires_in
        };
        self.leases
            .lock()
            .unwrap()
            .insert(key.to_string(), (expiry, owner.to_string()));
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let mut leases = self.leases.lock().unwrap();
        match leases.get(key) {
            Some((expiry, _)) if *expiry > Instant::now() => Ok(false),
            _ => {
                leases.insert(key.to_string(), (Instant::now() + lease, owner.to_string()));
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str, owner: &str) -> Result<bool, StoreError> {
        let mut leases = self.leases.lock().unwrap();
        match leases.get(key) {
            Some((_, holder)) if holder == owner => {
                leases.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

const LEASE: Duration = Duration::from_secs(60);

#[tokio::test]
async fn runs_action_when_lock_is_free() {
    let service = LockService::with_owner(InMemoryLeaseStore::default(), "instance-a");

    let result: Result<u32, LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async { Ok(42) })
        .await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test]
async fn contention_skips_action() {
    let store = InMemoryLeaseStore::default();
    store.seed_lease("pda-sync", "instance-b", Duration::from_secs(300));
    let service = LockService::with_owner(store, "instance-a");

    let calls = AtomicUsize::new(0);
    let result: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.is_contention());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_lease_is_acquirable_by_anyone() {
    let store = InMemoryLeaseStore::default();
    store.seed_lease("pda-sync", "crashed-instance", Duration::ZERO);
    let service = LockService::with_owner(store, "instance-a");

    let result: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async { Ok(()) })
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn lock_is_released_after_success() {
    let service = LockService::with_owner(InMemoryLeaseStore::default(), "instance-a");

    let first: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async { Ok(()) })
        .await;
    assert!(first.is_ok());

    // Same instance can immediately re-acquire once the first run released.
    let second: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async { Ok(()) })
        .await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn lock_is_released_after_action_failure() {
    let store = InMemoryLeaseStore::default();
    let service = LockService::with_owner(store, "instance-a");

    let failed: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async {
            Err(std::io::Error::other("engine blew up"))
        })
        .await;
    assert!(matches!(failed.unwrap_err(), LockError::Action(_)));

    let retry: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async { Ok(()) })
        .await;
    assert!(retry.is_ok(), "lease was not released after a failed action");
}

#[tokio::test]
async fn release_requires_matching_owner() {
    let store = InMemoryLeaseStore::default();
    store.seed_lease("pda-sync", "instance-b", Duration::from_secs(300));

    assert!(!store.release("pda-sync", "instance-a").await.unwrap());
    assert_eq!(store.holder("pda-sync").as_deref(), Some("instance-b"));

    assert!(store.release("pda-sync", "instance-b").await.unwrap());
    assert!(store.holder("pda-sync").is_none());
}

#[tokio::test]
async fn distinct_keys_do_not_contend() {
    let store = InMemoryLeaseStore::default();
    store.seed_lease("other-job", "instance-b", Duration::from_secs(300));
    let service = LockService::with_owner(store, "instance-a");

    let result: Result<(), LockError<std::io::Error>> = service
        .with_lock("pda-sync", LEASE, || async { Ok(()) })
        .await;
    assert!(result.is_ok());
}
