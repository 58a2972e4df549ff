//! Microphone capture on a dedicated thread
//!
//! `cpal::Stream` is not `Send`, so a thread owns it for its whole life and the
//! handle only talks to that thread through channels. The cpal callback
//! down-mixes to mono into a shared ring buffer that the frame monitor reads.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use super::sources::{DEFAULT_SOURCE_ID, INPUT_PREFIX};

/// Mono samples kept for analysis (well over one 256-sample window)
const HISTORY_LIMIT: usize = 8192;

/// Audio capture errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No input device found")]
    NoInputDevice,

    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    #[error("Failed to build audio stream: {0}")]
    StreamError(String),

    #[error("Failed to start stream: {0}")]
    PlayError(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Thread error: {0}")]
    ThreadError(String),
}

/// What the capture thread opened
#[derive(Debug, Clone)]
pub struct CaptureInfo {
    pub device_name: String,
    pub sample_rate: u32,
    pub channels: usize,
}

enum CaptureCommand {
    Stop,
}

/// Open microphone. Dropping the handle (or calling `stop`) closes the stream
/// and joins the capture thread.
pub struct MicrophoneCapture {
    command_tx: mpsc::Sender<CaptureCommand>,
    thread_handle: Option<JoinHandle<()>>,
    buffer: Arc<Mutex<SampleHistory>>,
    info: CaptureInfo,
}

impl MicrophoneCapture {
    /// Open `source_id` (`"input:<device name>"`), or the default input for
    /// `None` and `"default"`.
    ///
    /// Blocks until the stream is playing or has failed to open, so call it
    /// off the async runtime.
    pub fn open(source_id: Option<&str>) -> Result<Self, CaptureError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let buffer = Arc::new(Mutex::new(SampleHistory::with_limit(HISTORY_LIMIT)));
        let buffer_clone = buffer.clone();
        let source_id = source_id.map(str::to_string);

        let thread_handle = thread::Builder::new()
            .name("microphone-capture".to_string())
            .spawn(move || run_capture_thread(source_id, buffer_clone, command_rx, ready_tx))
            .map_err(|e| CaptureError::ThreadError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(info)) => {
                log::info!(
                    "Microphone open: {} ({} Hz, {} channels)",
                    info.device_name,
                    info.sample_rate,
                    info.channels
                );
                Ok(Self {
                    command_tx,
                    thread_handle: Some(thread_handle),
                    buffer,
                    info,
                })
            }
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread_handle.join();
                Err(CaptureError::ThreadError(
                    "capture thread exited before the stream opened".to_string(),
                ))
            }
        }
    }

    /// Most recent `count` mono samples, oldest first
    pub fn latest_samples(&self, count: usize) -> Vec<f32> {
        self.buffer.lock().window(count)
    }

    /// Close the stream. Safe to call more than once.
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(CaptureCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            log::info!("Microphone released: {}", self.info.device_name);
        }
    }
}

impl Drop for MicrophoneCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Most recent mono samples, bounded; the oldest are dropped first.
///
/// Until a full analysis window has arrived, reads come back short and the
/// analyser treats the frame as silence.
pub struct SampleHistory {
    samples: VecDeque<f32>,
    limit: usize,
}

impl SampleHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    pub fn extend(&mut self, mono: impl IntoIterator<Item = f32>) {
        for sample in mono {
            if self.samples.len() == self.limit {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }

    /// Up to `window` newest samples, oldest first
    pub fn window(&self, window: usize) -> Vec<f32> {
        let skip = self.samples.len().saturating_sub(window);
        self.samples.iter().skip(skip).copied().collect()
    }
}

fn run_capture_thread(
    source_id: Option<String>,
    buffer: Arc<Mutex<SampleHistory>>,
    command_rx: mpsc::Receiver<CaptureCommand>,
    ready_tx: mpsc::Sender<Result<CaptureInfo, CaptureError>>,
) {
    let stream = match open_stream(source_id.as_deref(), buffer) {
        Ok((stream, info)) => {
            let _ = ready_tx.send(Ok(info));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Nothing to do here but keep the stream alive until told otherwise
    match command_rx.recv() {
        Ok(CaptureCommand::Stop) => log::debug!("Microphone capture stopping"),
        Err(_) => log::debug!("Microphone capture handle dropped"),
    }
    drop(stream);
}

fn find_device(source_id: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();
    match source_id {
        Some(id) if id.starts_with(INPUT_PREFIX) => {
            let device_name = id.trim_start_matches(INPUT_PREFIX);
            host.input_devices()
                .map_err(|e| CaptureError::ConfigError(e.to_string()))?
                .find(|d| d.name().map(|n| n == device_name).unwrap_or(false))
                .ok_or_else(|| CaptureError::SourceNotFound(device_name.to_string()))
        }
        None | Some(DEFAULT_SOURCE_ID) => {
            host.default_input_device().ok_or(CaptureError::NoInputDevice)
        }
        Some(other) => Err(CaptureError::SourceNotFound(other.to_string())),
    }
}

fn open_stream(
    source_id: Option<&str>,
    buffer: Arc<Mutex<SampleHistory>>,
) -> Result<(cpal::Stream, CaptureInfo), CaptureError> {
    let device = find_device(source_id)?;
    let config = device
        .default_input_config()
        .map_err(|e| CaptureError::ConfigError(e.to_string()))?;

    let info = CaptureInfo {
        device_name: device.name().unwrap_or_else(|_| "Unknown".to_string()),
        sample_rate: config.sample_rate().0,
        channels: config.channels() as usize,
    };
    let stream_config = config.config();
    let channels = info.channels;

    let stream = match config.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, buffer, channels),
        SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, buffer, channels),
        SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, buffer, channels),
        other => {
            return Err(CaptureError::ConfigError(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| CaptureError::StreamError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::PlayError(e.to_string()))?;

    Ok((stream, info))
}

fn build_stream<T: cpal::Sample + cpal::SizedSample>(
    device: &Device,
    config: &StreamConfig,
    buffer: Arc<Mutex<SampleHistory>>,
    channels: usize,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    f32: cpal::FromSample<T>,
{
    let channels = channels.max(1);
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = data.chunks(channels).map(|frame| {
                frame
                    .iter()
                    .map(|s| <f32 as cpal::Sample>::from_sample(*s))
                    .sum::<f32>()
                    / channels as f32
            });
            buffer.lock().extend(mono);
        },
        |err| {
            log::error!("Microphone stream error: {}", err);
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::SampleHistory;

    const WINDOW: usize = 256;

    fn ramp(from: usize, to: usize) -> impl Iterator<Item = f32> {
        (from..to).map(|i| i as f32)
    }

    #[test]
    fn warming_up_returns_a_short_window() {
        let mut history = SampleHistory::with_limit(8192);
        history.extend(ramp(0, 100));

        let window = history.window(WINDOW);
        assert_eq!(window.len(), 100);
        assert_eq!(window[0], 0.0);
    }

    #[test]
    fn window_is_the_newest_samples_in_time_order() {
        let mut history = SampleHistory::with_limit(8192);
        history.extend(ramp(0, 300));

        let window = history.window(WINDOW);
        assert_eq!(window.len(), WINDOW);
        assert_eq!(window[0], 44.0);
        assert_eq!(window[WINDOW - 1], 299.0);
    }

    #[test]
    fn oldest_samples_fall_out_past_the_limit() {
        let mut history = SampleHistory::with_limit(WINDOW);
        history.extend(ramp(0, WINDOW));
        history.extend(ramp(WINDOW, WINDOW + 10));

        let window = history.window(WINDOW * 2);
        assert_eq!(window.len(), WINDOW);
        assert_eq!(window[0], 10.0);
        assert_eq!(*window.last().unwrap(), (WINDOW + 9) as f32);
    }
}
