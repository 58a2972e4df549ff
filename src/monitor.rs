//! Frame monitor: the ~60 Hz loop that feeds snapshots to the blow tracker
//!
//! One task, one tracker, one writer. Cancellation arrives through an owned
//! shutdown channel and is checked before every frame; a frame already
//! running finishes but no further frame is started.

use crate::audio::{AudioEnergySnapshot, Sampler};
use crate::blow::{BlowDetection, BlowPhase, BlowTracker};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// One display refresh at 60 Hz
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Anything that can hand over one energy snapshot per frame
pub trait SnapshotSource: Send {
    fn next_snapshot(&mut self) -> AudioEnergySnapshot;

    /// Give up the underlying device. Called once when the loop ends.
    fn release(&mut self) {}
}

impl SnapshotSource for Sampler {
    fn next_snapshot(&mut self) -> AudioEnergySnapshot {
        self.snapshot()
    }

    fn release(&mut self) {
        Sampler::release(self)
    }
}

/// Why the monitor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// Candles were blown out
    Extinguished,
    /// Shutdown requested, shutdown sender dropped, or the session went away
    Cancelled,
}

/// Run the frame loop until the candles go out or the loop is cancelled.
///
/// `publish` receives every frame's result and returns `false` when the
/// session no longer wants frames (torn down, extinguished by hand). The
/// source is released on every exit path.
pub async fn run_monitor<S, F>(
    mut source: S,
    mut tracker: BlowTracker,
    mut shutdown_rx: mpsc::Receiver<()>,
    frame_interval: Duration,
    mut publish: F,
) -> MonitorExit
where
    S: SnapshotSource,
    F: FnMut(BlowDetection) -> bool,
{
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tracker.light();

    log::info!("Blow monitor started");

    let exit = loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                break MonitorExit::Cancelled;
            }
            _ = interval.tick() => {
                match shutdown_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break MonitorExit::Cancelled,
                    Err(TryRecvError::Empty) => {}
                }
                if tracker.phase() == BlowPhase::Extinguished {
                    break MonitorExit::Extinguished;
                }

                let snapshot = source.next_snapshot();
                let detection = tracker.observe(&snapshot);

                if !publish(detection) {
                    break MonitorExit::Cancelled;
                }
                if detection.is_extinguished {
                    break MonitorExit::Extinguished;
                }
            }
        }
    };

    source.release();
    log::info!("Blow monitor stopped: {:?}", exit);
    exit
}
