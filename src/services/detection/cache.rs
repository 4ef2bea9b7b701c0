// Classifier Cache
// Memoizes constructed classifiers by configuration with single-flight construction.
//
// The first caller for a key spawns the load as its own task and every caller,
// the first included, waits on a watch channel. Exactly one construction runs
// per key at a time, and a caller that stops waiting does not affect the load.
// Success is memoized; failure is broadcast to every waiter and the slot is
// cleared so the next call retries.

use crate::error::DetectError;
use crate::services::config_store::ClassifierConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::classifier::{Classifier, ClassifierHandle};

/// Builds a classifier for a configuration. Expensive; called at most once per key
/// while a previous load is still valid.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self, config: &ClassifierConfig) -> Result<Arc<dyn Classifier>, DetectError>;
}

type LoadResult = Result<ClassifierHandle, DetectError>;
type LoadReceiver = watch::Receiver<Option<LoadResult>>;

enum Slot {
    Ready(ClassifierHandle),
    /// `generation` identifies the load that owns the slot, so a load that
    /// outlived a `clear()` never touches its successor.
    Loading { generation: u64, rx: LoadReceiver },
}

type SlotMap = HashMap<String, Slot>;

pub struct ClassifierCache {
    loader: Arc<dyn ClassifierLoader>,
    slots: Arc<Mutex<SlotMap>>,
    generations: AtomicU64,
}

impl ClassifierCache {
    pub fn new(loader: Arc<dyn ClassifierLoader>) -> Self {
        Self {
            loader,
            slots: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
        }
    }

    /// Return the memoized handle for `config`, constructing it on first use.
    ///
    /// Dropping the returned future only stops this caller from waiting; a load
    /// it started keeps running for the others.
    pub async fn get_classifier(&self, config: &ClassifierConfig) -> Result<ClassifierHandle, DetectError> {
        let key = config.cache_key();

        let rx = {
            let mut slots = lock(&self.slots);
            match slots.get(&key) {
                Some(Slot::Ready(handle)) => return Ok(handle.clone()),
                Some(Slot::Loading { rx, .. }) => rx.clone(),
                None => {
                    let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    slots.insert(
                        key.clone(),
                        Slot::Loading {
                            generation,
                            rx: rx.clone(),
                        },
                    );
                    self.spawn_load(key.clone(), generation, config.clone(), tx);
                    rx
                }
            }
        };

        wait_for_load(rx).await
    }

    fn spawn_load(
        &self,
        key: String,
        generation: u64,
        config: ClassifierConfig,
        tx: watch::Sender<Option<LoadResult>>,
    ) {
        let loader = Arc::clone(&self.loader);
        let mut guard = LoadGuard {
            slots: Arc::clone(&self.slots),
            key,
            generation,
            armed: true,
        };

        tokio::spawn(async move {
            let key = guard.key.clone();
            info!(key = %key, model = %config.model, device = config.device.as_str(), "classifier.load.start");
            let started = Instant::now();
            let result = loader
                .load(&config)
                .await
                .map(|classifier| ClassifierHandle::new(classifier, key.as_str()));

            {
                let mut slots = lock(&guard.slots);
                let owned = owns_slot(&slots, &key, generation);
                match &result {
                    Ok(handle) => {
                        if owned {
                            slots.insert(key.clone(), Slot::Ready(handle.clone()));
                        }
                        info!(key = %key, elapsed_ms = started.elapsed().as_millis() as u64, "classifier.load.ready");
                    }
                    Err(e) => {
                        if owned {
                            slots.remove(&key);
                        }
                        warn!(key = %key, error = %e, "classifier.load.failed");
                    }
                }
                if !owned {
                    debug!(key = %key, generation, "classifier.load.superseded");
                }
                guard.armed = false;
            }

            let _ = tx.send(Some(result));
        });
    }

    /// Number of keys currently loaded or loading.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every memoized classifier; in-flight loads still finish for their waiters.
    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}

fn owns_slot(slots: &SlotMap, key: &str, generation: u64) -> bool {
    matches!(slots.get(key), Some(Slot::Loading { generation: g, .. }) if *g == generation)
}

async fn wait_for_load(mut rx: LoadReceiver) -> LoadResult {
    match rx.wait_for(|v| v.is_some()).await {
        Ok(value) => value
            .clone()
            .unwrap_or_else(|| Err(DetectError::ModelUnavailable("construction abandoned".to_string()))),
        Err(_) => Err(DetectError::ModelUnavailable("construction abandoned".to_string())),
    }
}

fn lock(slots: &Mutex<SlotMap>) -> std::sync::MutexGuard<'_, SlotMap> {
    // A panic while holding the lock cannot leave the map half-updated.
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears this load's own `Loading` slot if the load task dies before finishing.
struct LoadGuard {
    slots: Arc<Mutex<SlotMap>>,
    key: String,
    generation: u64,
    armed: bool,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = lock(&self.slots);
        if owns_slot(&slots, &self.key, self.generation) {
            slots.remove(&self.key);
        }
    }
}
