//! Debounced merge scheduling.
//!
//! Source refreshes arrive in bursts (an ERP sync touches sales, stock,
//! and prices within milliseconds). The scheduler coalesces a burst into
//! one pending [`MergeWindow`] and fires a single merge `debounce_delay`
//! after the burst quiets down, but never later than `max_merge_interval`
//! after the window opened; a continuous storm cannot defer the merge
//! forever.
//!
//! Invalidations that arrive while a merge is executing open a fresh
//! window, served after the running merge completes; nothing invalidated
//! mid-merge is lost.
//!
//! The worker is a spawned task. Its wait is a suspended `tokio::select!`
//! over the deadline sleep, a re-arm notification, and the shutdown
//! signal; it holds no thread while idle.

use crate::executor::MergeExecutor;
use mosaic_core::{CatalogCacheOptions, SourceKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Debounce bookkeeping for the pending (not yet executing) merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeWindow {
    /// When the first invalidation of this burst arrived.
    pub first_invalidation_at: Instant,
    /// When the latest invalidation arrived.
    pub last_invalidation_at: Instant,
}

impl MergeWindow {
    fn opened_at(now: Instant) -> Self {
        Self {
            first_invalidation_at: now,
            last_invalidation_at: now,
        }
    }

    /// When this window's merge should fire.
    fn deadline(&self, debounce: Duration, ceiling: Duration) -> Instant {
        let debounced = self.last_invalidation_at + debounce;
        let capped = self.first_invalidation_at + ceiling;
        debounced.min(capped)
    }
}

struct SchedulerShared {
    executor: Arc<MergeExecutor>,
    window: Mutex<Option<MergeWindow>>,
    wake: Notify,
    debounce_delay: Duration,
    max_merge_interval: Duration,
}

impl SchedulerShared {
    fn current_deadline(&self) -> Option<Instant> {
        self.window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .map(|w| w.deadline(self.debounce_delay, self.max_merge_interval))
    }

    fn take_window(&self) -> Option<MergeWindow> {
        self.window.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Coalesces invalidation bursts into single merge executions.
pub struct MergeScheduler {
    shared: Arc<SchedulerShared>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MergeScheduler {
    /// Create a scheduler and spawn its worker task.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(executor: Arc<MergeExecutor>, options: &CatalogCacheOptions) -> Self {
        let shared = Arc::new(SchedulerShared {
            executor,
            window: Mutex::new(None),
            wake: Notify::new(),
            debounce_delay: options.debounce_delay,
            max_merge_interval: options.max_merge_interval,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(worker_loop(Arc::clone(&shared), shutdown_rx));

        Self {
            shared,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Record an invalidation and (re)arm the debounce timer.
    ///
    /// Returns immediately; never blocks the caller. Opens a window if
    /// none is pending, otherwise extends the pending one.
    pub fn schedule_merge(&self, kind: SourceKind) {
        let now = Instant::now();
        {
            let mut window = self.shared.window.lock().unwrap_or_else(|e| e.into_inner());
            match window.as_mut() {
                Some(w) => w.last_invalidation_at = now,
                None => *window = Some(MergeWindow::opened_at(now)),
            }
        }
        tracing::debug!(source = %kind, "Merge scheduled");
        self.shared.wake.notify_one();
    }

    /// Whether the executor is running a merge right now.
    pub fn is_merge_in_progress(&self) -> bool {
        self.shared.executor.is_merge_in_progress()
    }

    /// The pending window, if any invalidation is waiting for its merge.
    pub fn pending_window(&self) -> Option<MergeWindow> {
        *self.shared.window.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// A merge already executing runs to completion; a pending window is
    /// abandoned.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(shared: Arc<SchedulerShared>, mut shutdown_rx: watch::Receiver<bool>) {
    tracing::debug!("Merge scheduler worker started");

    loop {
        // Park until some window is pending.
        while shared.current_deadline().is_none() {
            tokio::select! {
                _ = shared.wake.notified() => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Merge scheduler worker stopping");
                        return;
                    }
                }
            }
        }

        // Wait out the debounce, re-arming as the deadline moves.
        let fire = loop {
            let Some(deadline) = shared.current_deadline() else {
                break false;
            };
            if Instant::now() >= deadline {
                break true;
            }
            tokio::select! {
                _ = sleep_until(deadline) => {}
                _ = shared.wake.notified() => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Merge scheduler worker stopping");
                        return;
                    }
                }
            }
        };
        if !fire {
            continue;
        }

        // Clear the window before executing: invalidations arriving during
        // the merge open a new one and get their own run.
        shared.take_window();

        match shared.executor.execute_merge().await {
            Ok(snapshot) => {
                tracing::info!(records = snapshot.len(), "Background merge completed");
            }
            Err(error) => {
                tracing::error!(
                    error = %error,
                    "Background merge failed, keeping previous snapshot"
                );
            }
        }
    }
}
