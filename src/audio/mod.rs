//! Microphone sampling: capture plus frequency analysis

mod analyser;
mod capture;
mod sources;

pub use analyser::{AudioEnergySnapshot, FrequencyAnalyser};
pub use capture::{CaptureError, MicrophoneCapture};
pub use sources::{list_sources, AudioSource, SourceError};

/// Analyser configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Analysis window in samples; snapshots carry half as many bins
    pub fft_size: usize,

    /// Weight of the previous frame when smoothing magnitudes (0-1)
    pub smoothing: f32,

    /// Level mapped to byte 0
    pub min_decibels: f32,

    /// Level mapped to byte 255
    pub max_decibels: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Live microphone turned into one energy snapshot per call.
///
/// Owns the device exclusively; dropping it releases the microphone.
pub struct Sampler {
    capture: MicrophoneCapture,
    analyser: FrequencyAnalyser,
}

impl Sampler {
    /// Open the microphone. Blocking, see `MicrophoneCapture::open`.
    pub fn acquire(source_id: Option<&str>, config: &SamplerConfig) -> Result<Self, CaptureError> {
        let capture = MicrophoneCapture::open(source_id)?;
        Ok(Self {
            capture,
            analyser: FrequencyAnalyser::new(config),
        })
    }

    pub fn snapshot(&mut self) -> AudioEnergySnapshot {
        let samples = self.capture.latest_samples(self.analyser.fft_size());
        self.analyser.snapshot(&samples)
    }

    /// Release the microphone now rather than on drop
    pub fn release(&mut self) {
        self.capture.stop();
    }
}
