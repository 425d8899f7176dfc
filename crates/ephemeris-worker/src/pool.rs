//! Bounded-queue dispatcher over a fixed set of [`WorkerSlot`]s.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Semaphore};

use crate::error::WorkerError;
use crate::slot::WorkerSlot;
use crate::state::WorkerState;

/// Static launch parameters for a pool's worker subprocesses.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub command: String,
    pub args: Vec<String>,
    pub worker_count: usize,
    pub queue_size: usize,
    pub job_timeout: Duration,
    pub max_replacements_per_min: u32,
}

/// Aggregate health snapshot for `/healthz`.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolHealth {
    pub idle: usize,
    pub busy: usize,
    pub dead: usize,
    pub initializing: usize,
    pub draining: usize,
    pub queue_depth: usize,
    pub jobs_completed: u64,
    pub avg_job_time_ms: f64,
    pub replacements_last_minute: usize,
}

/// A bounded pool of isolated worker processes.
///
/// Admission is gated by a semaphore sized `worker_count + queue_size`: a
/// `submit` call that can't acquire a permit fails immediately with
/// [`WorkerError::Overloaded`] rather than waiting. Once admitted, a caller
/// waits for the next slot to report itself idle — this *is* the FIFO
/// queue: admission order determines the order permits are handed out by
/// the OS/runtime scheduler.
pub struct WorkerPool {
    slots: Vec<Arc<Mutex<WorkerSlot>>>,
    config: PoolConfig,
    admission: Arc<Semaphore>,
    idle_tx: mpsc::UnboundedSender<usize>,
    idle_rx: Mutex<mpsc::UnboundedReceiver<usize>>,
    jobs_completed: AtomicU64,
    total_job_time_ms: AtomicU64,
    replacements: Mutex<VecDeque<Instant>>,
    draining: AtomicBool,
}

impl WorkerPool {
    /// Spawn `config.worker_count` slots and open the dispatcher.
    pub async fn start(config: PoolConfig) -> Result<Self, WorkerError> {
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        let mut slots = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            let slot = WorkerSlot::spawn(id, &config.command, &config.args).await?;
            slots.push(Arc::new(Mutex::new(slot)));
            idle_tx.send(id).expect("receiver held by the pool itself");
        }
        let admission = Arc::new(Semaphore::new(config.worker_count + config.queue_size));
        Ok(Self {
            slots,
            config,
            admission,
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            jobs_completed: AtomicU64::new(0),
            total_job_time_ms: AtomicU64::new(0),
            replacements: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
        })
    }

    /// Submit a job. Resolves once a slot has produced a result or a
    /// terminal error. This call suspends while queued; it never blocks
    /// once a free slot has been claimed.
    ///
    /// A job that lands on a slot that then dies (crash, timeout) is
    /// retried once on another slot before the error is surfaced; a
    /// structured worker error is returned as-is without retry.
    pub async fn submit(&self, payload: Value) -> Result<Value, WorkerError> {
        if self.draining.load(Ordering::Acquire) {
            return Err(WorkerError::ShuttingDown);
        }
        let _permit = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| WorkerError::Overloaded)?;

        let mut last_err = None;
        for attempt in 0..2 {
            // Bounded wait for a free slot: if every slot is dead and
            // replacement is rate-limited, no idle token will ever arrive.
            let idx = {
                let mut rx = self.idle_rx.lock().await;
                match tokio::time::timeout(self.config.job_timeout, rx.recv()).await {
                    Ok(Some(idx)) => idx,
                    Ok(None) => return Err(WorkerError::ShuttingDown),
                    Err(_) => return Err(last_err.unwrap_or(WorkerError::Timeout)),
                }
            };

            let slot = Arc::clone(&self.slots[idx]);
            let started = Instant::now();
            let result = {
                let mut guard = slot.lock().await;
                guard.run_job(payload.clone(), self.config.job_timeout).await
            };
            self.total_job_time_ms.fetch_add(started.elapsed().as_millis() as u64, Ordering::Relaxed);

            match result {
                Ok(value) => {
                    self.jobs_completed.fetch_add(1, Ordering::Relaxed);
                    let _ = self.idle_tx.send(idx);
                    return Ok(value);
                }
                Err(e @ WorkerError::JobFailed(_)) => {
                    // The worker answered; the slot is still healthy.
                    self.jobs_completed.fetch_add(1, Ordering::Relaxed);
                    let _ = self.idle_tx.send(idx);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(slot = idx, attempt, error = %e, "worker slot died running job");
                    self.try_replace(idx).await;
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(WorkerError::ShuttingDown))
    }

    /// Replace a dead slot, subject to `max_replacements_per_min`. If the
    /// rate limit is exceeded, the slot is left dead and no new idle token
    /// is issued for it (shrinking effective capacity until load subsides).
    async fn try_replace(&self, idx: usize) {
        {
            let guard = self.slots[idx].lock().await;
            if guard.is_alive() {
                // Not actually dead (e.g. transient compute error without a
                // process crash) — recycle the slot as idle.
                drop(guard);
                let _ = self.idle_tx.send(idx);
                return;
            }
        }

        let now = Instant::now();
        let mut window = self.replacements.lock().await;
        while window.front().is_some_and(|t| now.duration_since(*t) > Duration::from_secs(60)) {
            window.pop_front();
        }
        if window.len() as u32 >= self.config.max_replacements_per_min {
            return;
        }

        match WorkerSlot::spawn(idx, &self.config.command, &self.config.args).await {
            Ok(new_slot) => {
                let mut guard = self.slots[idx].lock().await;
                *guard = new_slot;
                window.push_back(now);
                drop(guard);
                let _ = self.idle_tx.send(idx);
            }
            Err(_) => {
                // Leave the slot dead; pool capacity shrinks by one.
            }
        }
    }

    /// Begin a graceful shutdown: refuse new submissions, let in-flight
    /// jobs finish, then kill every process.
    ///
    /// Acquiring each slot's lock waits out any job currently running on
    /// it (the dispatching `submit` holds the lock for the job's
    /// duration), so by the time a slot is killed it has finished its
    /// current work.
    pub async fn shutdown(&self) {
        self.draining.store(true, Ordering::Release);
        for slot in &self.slots {
            let mut guard = slot.lock().await;
            guard.begin_draining();
            guard.kill().await;
        }
    }

    pub async fn health(&self) -> PoolHealth {
        let mut h = PoolHealth {
            idle: 0,
            busy: 0,
            dead: 0,
            initializing: 0,
            draining: 0,
            queue_depth: 0,
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            avg_job_time_ms: 0.0,
            replacements_last_minute: 0,
        };
        for slot in &self.slots {
            match slot.lock().await.state() {
                WorkerState::Idle => h.idle += 1,
                WorkerState::Busy => h.busy += 1,
                WorkerState::Dead => h.dead += 1,
                WorkerState::Initializing => h.initializing += 1,
                WorkerState::Draining => h.draining += 1,
            }
        }
        h.queue_depth = self
            .config
            .worker_count
            .saturating_add(self.config.queue_size)
            .saturating_sub(self.admission.available_permits());
        let completed = h.jobs_completed.max(1);
        h.avg_job_time_ms = self.total_job_time_ms.load(Ordering::Relaxed) as f64 / completed as f64;
        h.replacements_last_minute = self.replacements.lock().await.len();
        h
    }
}
