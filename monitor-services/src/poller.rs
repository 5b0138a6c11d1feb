//! Interval-driven polling with manual refresh triggers
//!
//! A single coordinating task owns the poll loop: it wakes on every interval
//! tick or manual trigger, runs one aggregation cycle inline, and publishes
//! the finished snapshot through a watch channel. Because the cycle is
//! awaited inside the loop, at most one cycle is ever in flight, and a
//! capacity-1 trigger channel coalesces triggers that arrive mid-cycle into
//! at most one queued rerun.

use std::sync::Arc;
use std::time::Duration;

use monitor_core::Snapshot;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::roster::Roster;

struct RunningPoller {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives aggregation cycles and publishes snapshots
///
/// Idle until [`Poller::start`]; while running, every tick or trigger
/// produces one new complete snapshot. Readers always observe either the
/// previous complete snapshot or the new one, never a partial state.
pub struct Poller {
    aggregator: Aggregator,
    roster: Arc<Roster>,
    interval: Duration,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    running: Option<RunningPoller>,
}

impl Poller {
    pub fn new(aggregator: Aggregator, roster: Roster, interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            aggregator,
            roster: Arc::new(roster),
            interval,
            snapshot_tx,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Transition Idle -> Running; a no-op when already running
    ///
    /// The first interval tick fires immediately, so a snapshot is published
    /// shortly after start without waiting a full interval.
    pub fn start(&mut self) {
        if self.running.is_some() {
            debug!("Poller already running");
            return;
        }

        // Capacity 1: a trigger arriving while a cycle is in flight queues at
        // most one rerun; anything beyond that is coalesced.
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let aggregator = self.aggregator.clone();
        let roster = Arc::clone(&self.roster);
        let snapshot_tx = self.snapshot_tx.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_ms = interval.as_millis() as u64, "Poller started");

            loop {
                // Shutdown checked first: a stop request must win the race
                // against an already-due tick or pending trigger, otherwise
                // one extra cycle could start after stop() was requested.
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                    Some(()) = trigger_rx.recv() => {
                        debug!("Manual refresh triggered");
                    }
                }

                // The cycle runs inline, so no second cycle can start until
                // this one has completed and published.
                let snapshot = aggregator.aggregate(&roster).await;
                let _ = snapshot_tx.send(Some(Arc::new(snapshot)));
            }

            info!("Poller stopped");
        });

        self.running = Some(RunningPoller {
            trigger_tx,
            shutdown_tx,
            handle,
        });
    }

    /// Request one refresh cycle outside the normal cadence
    ///
    /// Coalesced when a rerun is already queued; a no-op when idle.
    pub fn trigger(&self) {
        if let Some(running) = &self.running {
            if running.trigger_tx.try_send(()).is_err() {
                debug!("Refresh already pending, trigger coalesced");
            }
        }
    }

    /// Transition Running -> Idle; a no-op when idle
    ///
    /// Cooperative: an in-flight cycle completes and publishes before the
    /// task exits, but no further cycles start.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown_tx.send(());
            let _ = running.handle.await;
        }
    }

    /// Subscribe to snapshot publications
    ///
    /// The receiver holds `None` until the first cycle completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_tx.subscribe()
    }

    /// The snapshot stream form of [`Poller::subscribe`]
    pub fn snapshots(&self) -> WatchStream<Option<Arc<Snapshot>>> {
        WatchStream::new(self.snapshot_tx.subscribe())
    }

    /// The most recently published snapshot, if any cycle has completed
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_tx.borrow().clone()
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("accounts", &self.roster.len())
            .field("interval", &self.interval)
            .field("running", &self.running.is_some())
            .finish()
    }
}
