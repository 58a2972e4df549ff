//! Blow detection lifecycle: open the microphone, run the monitor, tear down
//!
//! At most one monitor owns a microphone. Every start tears the previous one
//! down first, and a start overtaken by a newer one while its microphone was
//! still opening hands that microphone straight back.

use crate::audio::{CaptureError, Sampler, SamplerConfig};
use crate::blow::BlowTracker;
use crate::monitor::{self, MonitorExit, SnapshotSource, FRAME_INTERVAL};
use crate::state::{AppState, BlowStatus, Publish};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Detection lifecycle errors
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Microphone task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Something that can open a microphone as a frame source
pub trait Microphone: Clone + Send + 'static {
    type Source: SnapshotSource + 'static;

    /// Blocking; called on a blocking thread
    fn acquire(
        &self,
        source_id: Option<&str>,
        config: &SamplerConfig,
    ) -> Result<Self::Source, CaptureError>;
}

/// The real input device through cpal
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalMicrophone;

impl Microphone for CpalMicrophone {
    type Source = Sampler;

    fn acquire(
        &self,
        source_id: Option<&str>,
        config: &SamplerConfig,
    ) -> Result<Sampler, CaptureError> {
        Sampler::acquire(source_id, config)
    }
}

/// Receiver of candle status changes
pub trait StatusSink: Clone + Send + Sync + 'static {
    fn blow_state(&self, status: BlowStatus);

    /// Fired once per lit session, after the matching `blow_state`
    fn extinguished(&self, status: BlowStatus);
}

/// Stop the blow monitor, if any, and wait for it to release the microphone
pub async fn stop(state: &Arc<Mutex<AppState>>) {
    let (shutdown_tx, task) = state.lock().take_monitor();

    if let Some(tx) = shutdown_tx {
        let _ = tx.send(()).await;
    }
    if let Some(task) = task {
        let _ = task.await;
    }
}

/// Open the microphone and start the blow monitor for a lit session.
///
/// Returns whether detection is running. A missing or refused microphone is
/// not an error: the candles stay lit and can be put out by hand.
pub async fn start<M, E>(
    microphone: &M,
    events: &E,
    state: &Arc<Mutex<AppState>>,
    source_id: Option<String>,
) -> Result<bool, DetectionError>
where
    M: Microphone,
    E: StatusSink,
{
    // Never reuse a previous source
    stop(state).await;

    let (sampler_config, blow_config, expected_generation) = {
        let app_state = state.lock();
        if app_state.session.is_extinguished || !app_state.session.config_completed {
            return Ok(false);
        }
        (
            app_state.sampler_config.clone(),
            app_state.blow_config.clone(),
            app_state.monitor_generation,
        )
    };

    let opener = microphone.clone();
    let acquired = tokio::task::spawn_blocking(move || {
        opener.acquire(source_id.as_deref(), &sampler_config)
    })
    .await?;

    let mut source = match acquired {
        Ok(source) => source,
        Err(e) => {
            log::warn!("Microphone unavailable, blow detection disabled: {}", e);
            let status = {
                let mut app_state = state.lock();
                if app_state.monitor_generation == expected_generation {
                    app_state.mic_available = false;
                }
                app_state.blow_status()
            };
            events.blow_state(status);
            return Ok(false);
        }
    };

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    let begun = {
        let mut app_state = state.lock();
        let still_wanted = app_state.monitor_generation == expected_generation
            && app_state.session.config_completed
            && !app_state.session.is_extinguished;
        if still_wanted {
            let generation = app_state.begin_monitor(shutdown_tx);
            Some((generation, app_state.blow_status()))
        } else {
            None
        }
    };

    let Some((generation, status)) = begun else {
        log::info!("Detection superseded while the microphone was opening");
        source.release();
        return Ok(false);
    };
    events.blow_state(status);

    let task_state = state.clone();
    let task_events = events.clone();
    let task = tokio::spawn(async move {
        let publish_state = task_state.clone();
        let exit = monitor::run_monitor(
            source,
            BlowTracker::new(blow_config),
            shutdown_rx,
            FRAME_INTERVAL,
            move |detection| {
                let (outcome, status) = {
                    let mut app_state = publish_state.lock();
                    let outcome = app_state.publish_detection(generation, detection);
                    (outcome, app_state.blow_status())
                };
                match outcome {
                    Publish::Stale => false,
                    Publish::Unchanged => true,
                    Publish::Changed => {
                        task_events.blow_state(status);
                        true
                    }
                    Publish::Extinguished => {
                        log::info!("Candles blown out");
                        task_events.blow_state(status.clone());
                        task_events.extinguished(status);
                        true
                    }
                }
            },
        )
        .await;

        if exit == MonitorExit::Extinguished {
            task_state.lock().end_monitor(generation);
        }
    });

    let mut app_state = state.lock();
    if app_state.monitor_generation == generation {
        app_state.monitor_task = Some(task);
    }
    Ok(true)
}

/// Put the candles out by hand
pub async fn extinguish<E: StatusSink>(events: &E, state: &Arc<Mutex<AppState>>) -> BlowStatus {
    stop(state).await;

    let (changed, status) = {
        let mut app_state = state.lock();
        let changed = app_state.extinguish();
        (changed, app_state.blow_status())
    };
    if changed {
        events.blow_state(status.clone());
        events.extinguished(status.clone());
    }
    status
}

/// Light the candles again on a freshly opened microphone
pub async fn relight<M, E>(
    microphone: &M,
    events: &E,
    state: &Arc<Mutex<AppState>>,
    source_id: Option<String>,
) -> Result<BlowStatus, DetectionError>
where
    M: Microphone,
    E: StatusSink,
{
    stop(state).await;
    let status = {
        let mut app_state = state.lock();
        app_state.relight();
        app_state.blow_status()
    };
    events.blow_state(status);

    start(microphone, events, state, source_id).await?;
    Ok(state.lock().blow_status())
}
