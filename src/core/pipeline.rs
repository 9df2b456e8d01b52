//! Asynchronous ingestion pipeline
//!
//! A bounded channel feeds a single worker thread that hands each event to a
//! handler in submission order. Shutdown is signalled by dropping the sender
//! half of a zero-capacity channel; the worker then drains whatever is still
//! queued before exiting, so every accepted event is processed exactly once.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::error::{LoggerError, Result};
use super::event::LogEvent;
use super::metrics::PipelineMetrics;

const STATE_STOPPED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_DRAINING: u8 = 2;

/// Queue-full drops are reported on stderr once per this many drops.
const DROP_ALERT_INTERVAL: u64 = 1000;

/// Behavior when the event queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPolicy {
    /// Block the producer until space frees up or the pipeline stops
    #[default]
    Block,
    /// Drop the event, count it, and return an error
    DropOnFull,
}

/// Bounded single-worker event pipeline.
pub struct AsyncPipeline {
    state: AtomicU8,
    policy: SubmitPolicy,
    capacity: usize,
    events: Sender<LogEvent>,
    // Dropping this sender closes the channel the worker selects on,
    // which is the drain signal.
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<PipelineMetrics>,
}

impl AsyncPipeline {
    /// Spawn the worker and return a running pipeline.
    ///
    /// `handler` runs on the worker thread for every accepted event, in
    /// submission order.
    pub fn start<F>(capacity: usize, policy: SubmitPolicy, handler: F) -> Result<Self>
    where
        F: Fn(LogEvent) + Send + 'static,
    {
        Self::start_with_metrics(capacity, policy, Arc::new(PipelineMetrics::new()), handler)
    }

    /// Like [`AsyncPipeline::start`] but counting into a shared metrics
    /// handle owned by the caller.
    pub fn start_with_metrics<F>(
        capacity: usize,
        policy: SubmitPolicy,
        metrics: Arc<PipelineMetrics>,
        handler: F,
    ) -> Result<Self>
    where
        F: Fn(LogEvent) + Send + 'static,
    {
        if capacity == 0 {
            return Err(LoggerError::config(
                "AsyncPipeline",
                "capacity must be at least 1",
            ));
        }

        let (events_tx, events_rx) = bounded::<LogEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let worker_metrics = Arc::clone(&metrics);
        let worker_shutdown = shutdown_rx.clone();
        let worker = std::thread::Builder::new()
            .name("logroute-worker".to_string())
            .spawn(move || {
                Self::worker_loop(&events_rx, &worker_shutdown, &handler, &worker_metrics);
            })
            .map_err(|e| LoggerError::io_operation("spawning worker", "thread spawn failed", e))?;

        Ok(Self {
            state: AtomicU8::new(STATE_RUNNING),
            policy,
            capacity,
            events: events_tx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            worker: Mutex::new(Some(worker)),
            metrics,
        })
    }

    fn worker_loop<F>(
        events: &Receiver<LogEvent>,
        shutdown: &Receiver<()>,
        handler: &F,
        metrics: &PipelineMetrics,
    ) where
        F: Fn(LogEvent),
    {
        loop {
            crossbeam_channel::select! {
                recv(events) -> event => {
                    match event {
                        Ok(event) => {
                            handler(event);
                            metrics.record_processed();
                        }
                        // all senders gone; nothing left to drain
                        Err(_) => return,
                    }
                }
                recv(shutdown) -> _ => {
                    // drain everything accepted before the signal
                    while let Ok(event) = events.try_recv() {
                        handler(event);
                        metrics.record_processed();
                    }
                    return;
                }
            }
        }
    }

    /// Submit one event for processing.
    ///
    /// Returns `PipelineStopped` after shutdown has begun; under
    /// `DropOnFull`, a full queue returns `QueueFull` with the event
    /// discarded and counted.
    pub fn submit(&self, event: LogEvent) -> Result<()> {
        if self.state.load(Ordering::Acquire) != STATE_RUNNING {
            return Err(LoggerError::PipelineStopped);
        }

        match self.policy {
            SubmitPolicy::DropOnFull => match self.events.try_send(event) {
                Ok(()) => {
                    self.metrics.record_submitted();
                    Ok(())
                }
                Err(TrySendError::Full(_)) => {
                    self.metrics.record_submitted();
                    let dropped = self.metrics.record_dropped();
                    if dropped % DROP_ALERT_INTERVAL == 1 {
                        eprintln!(
                            "[logroute] queue full ({} events), {} dropped so far",
                            self.capacity, dropped
                        );
                    }
                    Err(LoggerError::queue_full(self.capacity))
                }
                Err(TrySendError::Disconnected(_)) => Err(LoggerError::PipelineStopped),
            },
            SubmitPolicy::Block => {
                crossbeam_channel::select! {
                    send(self.events, event) -> result => match result {
                        Ok(()) => {
                            self.metrics.record_submitted();
                            Ok(())
                        }
                        Err(_) => Err(LoggerError::PipelineStopped),
                    },
                    recv(self.shutdown_rx) -> _ => Err(LoggerError::PipelineStopped),
                }
            }
        }
    }

    /// Stop accepting events, drain the queue, and join the worker.
    /// Safe to call more than once; later calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        // closing the shutdown channel wakes the worker into its drain loop
        drop(self.shutdown_tx.lock().take());

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                eprintln!("[logroute] worker thread panicked during shutdown");
            }
        }
        self.state.store(STATE_STOPPED, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }
}

impl Drop for AsyncPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
