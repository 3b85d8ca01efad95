//! In-memory object store with fault injection.

use crate::{ObjectStore, StorageError, StorageErrorKind};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// A scripted failure for gets or puts.
#[derive(Debug, Clone)]
struct Fault {
    kind: StorageErrorKind,
    /// Only keys containing this fragment fail
    key_contains: Option<String>,
    /// Remaining failures before the fault clears itself; `None` is forever
    remaining: Option<u32>,
}

impl Fault {
    fn applies_to(&self, key: &str) -> bool {
        self.key_contains
            .as_deref()
            .map_or(true, |fragment| key.contains(fragment))
    }
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeSet<String>,
    objects: BTreeMap<(String, String), StoredObject>,
    get_faults: Vec<Fault>,
    put_faults: Vec<Fault>,
    get_calls: u32,
    put_calls: u32,
}

/// Object store kept in process memory.
///
/// Buckets must be created before objects can be written to them, so a
/// misconfigured bucket name surfaces as [`StorageErrorKind::NoSuchBucket`]
/// just as it would against S3. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already contains one empty bucket.
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.create_bucket(bucket);
        store
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.lock().buckets.insert(bucket.to_string());
    }

    /// Seed an object directly, creating the bucket if needed.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.buckets.insert(bucket.to_string());
        state.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
    }

    pub fn object_string(&self, bucket: &str, key: &str) -> Option<String> {
        self.object(bucket, key)
            .map(|body| String::from_utf8_lossy(&body).into_owned())
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.content_type.clone())
    }

    /// All keys in a bucket, in lexicographic order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Make every get fail with `kind` until cleared.
    pub fn fail_gets(&self, kind: StorageErrorKind) {
        self.lock().get_faults.push(Fault {
            kind,
            key_contains: None,
            remaining: None,
        });
    }

    /// Make the next `times` gets fail with `kind`.
    pub fn fail_gets_times(&self, times: u32, kind: StorageErrorKind) {
        self.lock().get_faults.push(Fault {
            kind,
            key_contains: None,
            remaining: Some(times),
        });
    }

    /// Make every put fail with `kind` until cleared.
    pub fn fail_puts(&self, kind: StorageErrorKind) {
        self.fail_puts_matching("", kind);
    }

    /// Make puts to keys containing `fragment` fail with `kind` until cleared.
    pub fn fail_puts_matching(&self, fragment: &str, kind: StorageErrorKind) {
        self.lock().put_faults.push(Fault {
            kind,
            key_contains: Some(fragment.to_string()),
            remaining: None,
        });
    }

    /// Make the next `times` puts fail with `kind`.
    pub fn fail_puts_times(&self, times: u32, kind: StorageErrorKind) {
        self.lock().put_faults.push(Fault {
            kind,
            key_contains: None,
            remaining: Some(times),
        });
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.get_faults.clear();
        state.put_faults.clear();
    }

    /// Number of get calls received, including failed ones.
    pub fn get_calls(&self) -> u32 {
        self.lock().get_calls
    }

    /// Number of put calls received, including failed ones.
    pub fn put_calls(&self) -> u32 {
        self.lock().put_calls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn take_fault(faults: &mut Vec<Fault>, key: &str) -> Option<StorageErrorKind> {
    let idx = faults.iter().position(|f| f.applies_to(key))?;
    let fault = &mut faults[idx];
    let kind = fault.kind;
    if let Some(remaining) = fault.remaining.as_mut() {
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            faults.remove(idx);
        }
    }
    Some(kind)
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let mut state = self.lock();
        state.get_calls += 1;

        if let Some(kind) = take_fault(&mut state.get_faults, key) {
            return Err(StorageError::new(kind, "get", bucket, key, "injected failure"));
        }
        if !state.buckets.contains(bucket) {
            return Err(StorageError::new(
                StorageErrorKind::NoSuchBucket,
                "get",
                bucket,
                key,
                "The specified bucket does not exist",
            ));
        }
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
            .ok_or_else(|| {
                StorageError::new(
                    StorageErrorKind::NotFound,
                    "get",
                    bucket,
                    key,
                    "The specified key does not exist",
                )
            })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.put_calls += 1;

        if let Some(kind) = take_fault(&mut state.put_faults, key) {
            return Err(StorageError::new(kind, "put", bucket, key, "injected failure"));
        }
        if !state.buckets.contains(bucket) {
            return Err(StorageError::new(
                StorageErrorKind::NoSuchBucket,
                "put",
                bucket,
                key,
                "The specified bucket does not exist",
            ));
        }
        state.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::with_bucket("b");
        store
            .put_object("b", "k", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();
        assert_eq!(store.get_object("b", "k").await.unwrap(), b"hello");
        assert_eq!(store.content_type("b", "k").as_deref(), Some("text/plain"));
        assert_eq!(store.keys("b"), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_key_and_missing_bucket() {
        let store = MemoryStore::with_bucket("b");
        let err = store.get_object("b", "nope").await.unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NotFound);

        let err = store.get_object("other", "k").await.unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NoSuchBucket);

        let err = store
            .put_object("other", "k", Vec::new(), "text/plain")
            .await
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NoSuchBucket);
    }

    #[tokio::test]
    async fn test_counted_faults_clear_themselves() {
        let store = MemoryStore::with_bucket("b");
        store.fail_puts_times(2, StorageErrorKind::Transient);

        for _ in 0..2 {
            let err = store
                .put_object("b", "k", b"x".to_vec(), "text/plain")
                .await
                .unwrap_err();
            assert_eq!(err.kind, StorageErrorKind::Transient);
        }
        store
            .put_object("b", "k", b"x".to_vec(), "text/plain")
            .await
            .unwrap();
        assert_eq!(store.put_calls(), 3);
    }

    #[tokio::test]
    async fn test_matching_faults_only_hit_matching_keys() {
        let store = MemoryStore::with_bucket("b");
        store.fail_puts_matching("last_extract", StorageErrorKind::AccessDenied);

        store
            .put_object("b", "t/csv/t_data_1.csv", b"x".to_vec(), "text/csv")
            .await
            .unwrap();
        let err = store
            .put_object("b", "t/csv/last_extract.txt", b"x".to_vec(), "text/plain")
            .await
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::AccessDenied);

        store.clear_failures();
        store
            .put_object("b", "t/csv/last_extract.txt", b"x".to_vec(), "text/plain")
            .await
            .unwrap();
    }

    #[test]
    fn test_clones_share_contents() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.insert("bucket", "key", "v");
        assert_eq!(b.object_string("bucket", "key").as_deref(), Some("v"));
    }
}
