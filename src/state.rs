//! Application state management

use crate::audio::SamplerConfig;
use crate::blow::{BlowDetection, BlowDetectionConfig, BlowPhase};
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Candle and microphone status reported to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowStatus {
    pub is_blowing: bool,
    pub is_extinguished: bool,
    /// False until a microphone has been opened, and after it was refused
    pub mic_available: bool,
    pub phase: BlowPhase,
}

/// Result of offering a frame's detection to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// The monitor that produced it is no longer the current one
    Stale,
    Unchanged,
    Changed,
    /// This frame put the candles out
    Extinguished,
}

/// Application state
pub struct AppState {
    /// Current cake, candles and text
    pub session: SessionConfig,

    /// Detector tuning used for the next lit session
    pub blow_config: BlowDetectionConfig,

    pub sampler_config: SamplerConfig,

    pub mic_available: bool,

    /// Shutdown signal sender for the blow monitor task
    pub monitor_shutdown_tx: Option<mpsc::Sender<()>>,

    pub monitor_task: Option<JoinHandle<()>>,

    /// Bumped whenever a monitor is started or torn down, so a monitor that
    /// is still finishing its last frame cannot write into a newer session
    pub monitor_generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            blow_config: BlowDetectionConfig::default(),
            sampler_config: SamplerConfig::default(),
            mic_available: false,
            monitor_shutdown_tx: None,
            monitor_task: None,
            monitor_generation: 0,
        }
    }
}

impl AppState {
    pub fn blow_status(&self) -> BlowStatus {
        let phase = if self.session.is_extinguished {
            BlowPhase::Extinguished
        } else if self.session.is_blowing {
            BlowPhase::Blowing
        } else if self.session.config_completed {
            BlowPhase::Lit
        } else {
            BlowPhase::Unlit
        };
        BlowStatus {
            is_blowing: self.session.is_blowing,
            is_extinguished: self.session.is_extinguished,
            mic_available: self.mic_available,
            phase,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor_shutdown_tx.is_some()
    }

    /// Register a new monitor, returning its generation
    pub fn begin_monitor(&mut self, shutdown_tx: mpsc::Sender<()>) -> u64 {
        self.monitor_generation += 1;
        self.monitor_shutdown_tx = Some(shutdown_tx);
        self.mic_available = true;
        self.monitor_generation
    }

    /// Detach the current monitor so it can be stopped outside the lock
    pub fn take_monitor(&mut self) -> (Option<mpsc::Sender<()>>, Option<JoinHandle<()>>) {
        self.monitor_generation += 1;
        (self.monitor_shutdown_tx.take(), self.monitor_task.take())
    }

    /// Called by a monitor after it exits on its own
    pub fn end_monitor(&mut self, generation: u64) {
        if self.monitor_generation == generation {
            self.monitor_shutdown_tx = None;
            self.monitor_task = None;
        }
    }

    /// Fold one frame's detection into the session flags.
    ///
    /// `is_extinguished` only ever flips on here; relighting is explicit.
    pub fn publish_detection(&mut self, generation: u64, detection: BlowDetection) -> Publish {
        if generation != self.monitor_generation || self.session.is_extinguished {
            return Publish::Stale;
        }

        if detection.is_extinguished {
            self.session.is_extinguished = true;
            self.session.is_blowing = false;
            return Publish::Extinguished;
        }

        if self.session.is_blowing == detection.is_blowing {
            Publish::Unchanged
        } else {
            self.session.is_blowing = detection.is_blowing;
            Publish::Changed
        }
    }

    /// Put the candles out without the microphone
    pub fn extinguish(&mut self) -> bool {
        let changed = !self.session.is_extinguished;
        self.session.is_extinguished = true;
        self.session.is_blowing = false;
        changed
    }

    pub fn relight(&mut self) {
        self.session.is_extinguished = false;
        self.session.is_blowing = false;
    }
}
