//! Frequency analyser producing byte spectra
//!
//! Matches what a browser analyser node reports for `getByteFrequencyData`:
//! Blackman window, magnitude spectrum, exponential smoothing across frames,
//! then decibels mapped linearly onto 0-255. Keeping these semantics means the
//! blow thresholds behave the same as in the web version.

use super::SamplerConfig;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// One frame of byte magnitudes, `fft_size / 2` bins
pub type AudioEnergySnapshot = Vec<u8>;

/// Blackman window coefficient for sample `index` of `size`
pub fn blackman_window(index: usize, size: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let phase = 2.0 * PI * index as f32 / size as f32;
    A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
}

pub struct FrequencyAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,

    // Smoothed linear magnitudes carried between frames
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl FrequencyAnalyser {
    pub fn new(config: &SamplerConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = (0..fft_size).map(|i| blackman_window(i, fft_size)).collect();

        Self {
            fft,
            fft_size,
            window,
            smoothing: config.smoothing.clamp(0.0, 1.0),
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyse the latest `fft_size` mono samples.
    ///
    /// Short input (capture still warming up) yields an all-zero snapshot and
    /// leaves the smoothing history untouched.
    pub fn snapshot(&mut self, samples: &[f32]) -> AudioEnergySnapshot {
        if samples.len() < self.fft_size {
            return vec![0; self.bin_count()];
        }
        let samples = &samples[samples.len() - self.fft_size..];

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.fft_size as f32;
        let tau = self.smoothing;
        let range = self.max_decibels - self.min_decibels;

        self.smoothed
            .iter_mut()
            .zip(&self.scratch)
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * scale;
                *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
                let db = 20.0 * smoothed.log10();
                let scaled = (255.0 / range * (db - self.min_decibels)).floor();
                // -inf dB (silence) saturates to 0
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}
