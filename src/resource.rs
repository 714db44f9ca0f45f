//! Keyed fetch-on-change cache.
//!
//! A [`Resource`] holds the value for one key at a time. Pointing it at a new
//! key marks the current value stale and spawns a fetch; when the fetch
//! finishes its result is applied only if the key is still current, so a slow
//! response for an old key can never overwrite a newer one.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Error, Result};

type FetchFuture<V> = Pin<Box<dyn Future<Output = Result<V>> + Send>>;
type Fetcher<K, V> = Arc<dyn Fn(K) -> FetchFuture<V> + Send + Sync>;
type ShortCircuit<K, V> = Arc<dyn Fn(&K) -> Option<V> + Send + Sync>;

/// Read-only view of a resource at one moment.
#[derive(Debug)]
pub struct Snapshot<V> {
    /// Last value fetched, possibly for an earlier key (see `stale`).
    pub value: Option<Arc<V>>,
    pub loading: bool,
    /// `value` belongs to a key other than the current one.
    pub stale: bool,
    pub error: Option<Error>,
}

impl<V> Snapshot<V> {
    /// The value, only if it belongs to the current key.
    pub fn fresh(&self) -> Option<&V> {
        if self.stale {
            None
        } else {
            self.value.as_deref()
        }
    }
}

impl<V> Clone for Snapshot<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            loading: self.loading,
            stale: self.stale,
            error: self.error.clone(),
        }
    }
}

struct Slot<K, V> {
    key: Option<K>,
    generation: u64,
    value: Option<Arc<V>>,
    loading: bool,
    stale: bool,
    error: Option<Error>,
}

/// A cached value keyed on `K`, refetched whenever the key changes.
///
/// Cloning yields another handle to the same cache.
pub struct Resource<K, V> {
    name: &'static str,
    slot: Arc<Mutex<Slot<K, V>>>,
    fetcher: Fetcher<K, V>,
    short_circuit: Option<ShortCircuit<K, V>>,
    revision: Arc<watch::Sender<u64>>,
}

impl<K, V> Clone for Resource<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            slot: Arc::clone(&self.slot),
            fetcher: Arc::clone(&self.fetcher),
            short_circuit: self.short_circuit.clone(),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<K, V> Resource<K, V>
where
    K: Clone + PartialEq + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (revision, _) = watch::channel(0);
        Self {
            name,
            slot: Arc::new(Mutex::new(Slot {
                key: None,
                generation: 0,
                value: None,
                loading: false,
                stale: false,
                error: None,
            })),
            fetcher: Arc::new(move |key: K| -> FetchFuture<V> { Box::pin(fetch(key)) }),
            short_circuit: None,
            revision: Arc::new(revision),
        }
    }

    /// Resolve some keys synchronously, without fetching.
    pub fn with_short_circuit<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&K) -> Option<V> + Send + Sync + 'static,
    {
        self.short_circuit = Some(Arc::new(resolve));
        self
    }

    /// Point the resource at `key`. Returns `false` if it already was.
    ///
    /// Must be called inside a tokio runtime unless the key short-circuits.
    pub fn load(&self, key: K) -> bool {
        {
            let slot = self.lock();
            if slot.key.as_ref() == Some(&key) {
                return false;
            }
        }
        self.start(key);
        true
    }

    /// Fetch the current key again.
    pub fn reload(&self) -> bool {
        let key = self.lock().key.clone();
        match key {
            Some(key) => {
                self.start(key);
                true
            }
            None => false,
        }
    }

    pub fn key(&self) -> Option<K> {
        self.lock().key.clone()
    }

    pub fn snapshot(&self) -> Snapshot<V> {
        let slot = self.lock();
        Snapshot {
            value: slot.value.clone(),
            loading: slot.loading,
            stale: slot.stale,
            error: slot.error.clone(),
        }
    }

    /// Notified with a new revision on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Wait until no fetch is in flight.
    pub async fn settled(&self) {
        let mut revisions = self.subscribe();
        while self.is_loading() {
            if revisions.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    fn start(&self, key: K) {
        let generation = {
            let mut slot = self.lock();
            let rekeyed = slot.key.as_ref() != Some(&key);
            slot.generation += 1;
            slot.key = Some(key.clone());
            slot.error = None;

            if let Some(value) = self.short_circuit.as_ref().and_then(|resolve| resolve(&key)) {
                debug!(resource = self.name, ?key, "resolved without fetching");
                slot.value = Some(Arc::new(value));
                slot.loading = false;
                slot.stale = false;
                drop(slot);
                self.bump();
                return;
            }

            slot.loading = true;
            slot.stale = slot.value.is_some() && (rekeyed || slot.stale);
            slot.generation
        };
        self.bump();

        debug!(resource = self.name, ?key, generation, "fetching");
        let fetch = (self.fetcher)(key);
        let resource = self.clone();
        tokio::spawn(async move {
            let result = fetch.await;
            resource.finish(generation, result);
        });
    }

    fn finish(&self, generation: u64, result: Result<V>) {
        {
            let mut slot = self.lock();
            if slot.generation != generation {
                debug!(
                    resource = self.name,
                    generation,
                    current = slot.generation,
                    "discarding result for superseded key"
                );
                return;
            }
            match result {
                Ok(value) => {
                    slot.value = Some(Arc::new(value));
                    slot.stale = false;
                    slot.error = None;
                }
                Err(e) => {
                    warn!(resource = self.name, key = ?slot.key, error = %e, "fetch failed");
                    slot.error = Some(e);
                }
            }
            slot.loading = false;
        }
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn lock(&self) -> MutexGuard<'_, Slot<K, V>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
