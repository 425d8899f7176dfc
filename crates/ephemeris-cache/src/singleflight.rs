//! Per-key compute coalescing: at most one in-flight computation per
//! fingerprint per process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

/// Shared outcome published once to all waiters on a given key.
type Outcome<T> = Result<T, String>;

/// Coordinates concurrent callers requesting the same key: the first
/// caller becomes the leader and registers the computation; everyone else
/// attaches as a waiter and receives the leader's result (or error).
///
/// The computation runs on a spawned task, so a cancelled caller — the
/// leader included — never tears it down: remaining waiters still receive
/// the result.
pub struct SingleFlight<T: Clone + Send + 'static> {
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<Outcome<T>>>>>,
}

impl<T: Clone + Send + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self { inflight: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl<T: Clone + Send + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `compute` for `key`, coalescing concurrent callers. Only the
    /// leader registers `compute`; every caller (leader included) then
    /// waits on the shared broadcast.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Outcome<T>> + Send + 'static,
    {
        let mut rx = {
            let mut table = self.inflight.lock().await;
            if let Some(tx) = table.get(key) {
                tx.subscribe()
            } else {
                let (tx, rx) = broadcast::channel(1);
                table.insert(key.to_string(), tx.clone());
                let inflight = Arc::clone(&self.inflight);
                let key = key.to_string();
                let fut = compute();
                tokio::spawn(async move {
                    let result = fut.await;
                    inflight.lock().await.remove(&key);
                    let _ = tx.send(result);
                });
                rx
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err("single-flight computation dropped without publishing a result".to_string()),
        }
    }
}

pub type SharedSingleFlight<T> = Arc<SingleFlight<T>>;
