//! In-memory [`ObjectClient`] for tests and offline use.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::client::{ObjectClient, ObjectStoreError};

#[derive(Debug, Default)]
struct State {
    bucket_exists: bool,
    objects: BTreeMap<String, (String, Vec<u8>)>,
    create_bucket_status: Option<u16>,
    presign_fails: bool,
    create_calls: usize,
}

/// An object client that keeps one bucket in memory.
///
/// Failure injection covers the cases the backend must tolerate or surface:
/// a refused bucket creation and a failing presign.
#[derive(Debug)]
pub struct MemoryObjectClient {
    bucket: String,
    state: Mutex<State>,
}

impl MemoryObjectClient {
    /// A client for a bucket that does not exist yet.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ObjectStoreError> {
        self.state
            .lock()
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> Option<T> {
        self.state.lock().ok().map(|mut state| f(&mut state))
    }

    /// Make bucket creation fail with `code` while leaving the bucket absent.
    pub fn refuse_bucket_creation(&self, code: u16) {
        self.with_state(|s| s.create_bucket_status = Some(code));
    }

    /// Make every presign request fail.
    pub fn fail_presign(&self) {
        self.with_state(|s| s.presign_fails = true);
    }

    /// Whether the bucket currently exists.
    #[must_use]
    pub fn has_bucket(&self) -> bool {
        self.with_state(|s| s.bucket_exists).unwrap_or(false)
    }

    /// How many times bucket creation was attempted.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.with_state(|s| s.create_calls).unwrap_or(0)
    }

    /// Every stored key, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.with_state(|s| s.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Content type and body of `key`.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.with_state(|s| s.objects.get(key).cloned()).flatten()
    }
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn bucket_exists(&self) -> Result<bool, ObjectStoreError> {
        Ok(self.lock()?.bucket_exists)
    }

    async fn create_bucket(&self) -> Result<(), ObjectStoreError> {
        let mut state = self.lock()?;
        state.create_calls = state.create_calls.saturating_add(1);
        if let Some(code) = state.create_bucket_status {
            return Err(ObjectStoreError::Status {
                code,
                message: "bucket creation refused".into(),
            });
        }
        if state.bucket_exists {
            return Err(ObjectStoreError::Status {
                code: 409,
                message: "BucketAlreadyOwnedByYou".into(),
            });
        }
        state.bucket_exists = true;
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        self.lock()?
            .objects
            .insert(key.to_owned(), (content_type.to_owned(), body));
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.lock()?
            .objects
            .get(key)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| ObjectStoreError::Status {
                code: 404,
                message: format!("NoSuchKey: {key}"),
            })
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.lock()?.objects.remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        if self.lock()?.presign_fails {
            return Err(ObjectStoreError::Transport("presign unavailable".into()));
        }
        Ok(format!(
            "memory://{}/{key}?X-Amz-Expires={}",
            self.bucket,
            ttl.as_secs()
        ))
    }
}
