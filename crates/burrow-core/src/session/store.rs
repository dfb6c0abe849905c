//! Session store keyed by remote identity.
//!
//! Sessions are created lazily on first contact and handed out behind
//! a per-identity async mutex: commands for one identity serialize on
//! it while different identities proceed in parallel. Retention is a
//! policy knob: by default sessions live for the process lifetime, but
//! a linger duration arms a background sweep that drops sessions idle
//! past it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::constants::STORE_SWEEP_INTERVAL;
use crate::gopher::Fetch;

use super::Session;

/// Retention configuration for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Drop sessions idle longer than this; `None` keeps them forever.
    pub linger: Option<Duration>,
    /// How often the sweep task looks for idle sessions.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            linger: None,
            sweep_interval: STORE_SWEEP_INTERVAL,
        }
    }
}

struct SessionSlot {
    session: Arc<AsyncMutex<Session>>,
    last_active: Instant,
}

/// Lazily-populated registry of per-identity sessions.
pub struct SessionStore {
    slots: Arc<AsyncMutex<HashMap<String, SessionSlot>>>,
    client: Arc<dyn Fetch>,
    shutdown_tx: watch::Sender<bool>,
    sweep_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Create a store whose sessions fetch through `client`.
    pub fn new(client: Arc<dyn Fetch>, config: StoreConfig) -> Self {
        let slots: Arc<AsyncMutex<HashMap<String, SessionSlot>>> =
            Arc::new(AsyncMutex::new(HashMap::new()));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let sweep_task = config.linger.map(|linger| {
            let slots = Arc::clone(&slots);
            let interval = config.sweep_interval;
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = tokio::time::sleep(interval) => {
                            let mut guard = slots.lock().await;
                            let before = guard.len();
                            // Never evict a session someone still holds.
                            guard.retain(|identity, slot| {
                                let keep = slot.last_active.elapsed() < linger
                                    || Arc::strong_count(&slot.session) > 1;
                                if !keep {
                                    info!(identity, "evicting idle session");
                                }
                                keep
                            });
                            let removed = before - guard.len();
                            if removed > 0 {
                                debug!(removed, remaining = guard.len(), "session sweep");
                            }
                        }
                    }
                }
            })
        });

        Self {
            slots,
            client,
            shutdown_tx,
            sweep_task: std::sync::Mutex::new(sweep_task),
        }
    }

    /// Fetch the session for an identity, creating it on first contact.
    pub async fn get_or_create(&self, identity: &str) -> Arc<AsyncMutex<Session>> {
        let mut guard = self.slots.lock().await;
        if let Some(slot) = guard.get_mut(identity) {
            slot.last_active = Instant::now();
            return Arc::clone(&slot.session);
        }

        info!(identity, "creating session");
        let session = Arc::new(AsyncMutex::new(Session::new(Arc::clone(&self.client))));
        guard.insert(
            identity.to_string(),
            SessionSlot {
                session: Arc::clone(&session),
                last_active: Instant::now(),
            },
        );
        session
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Stop the sweep task.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self
            .sweep_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}
