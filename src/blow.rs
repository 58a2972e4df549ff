//! Blow detection - low/mid band energy heuristic with frame debounce
//!
//! A blow across the microphone piles energy into the lowest bins while speech
//! and music carry comparatively more in the mid band. The detector compares the
//! two band averages on every snapshot and only reports the candles as
//! extinguished once enough consecutive frames agree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Blow detection config errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Blow threshold must be in (0, 1], got {0}")]
    Threshold(f32),

    #[error("Required consecutive frames must be greater than zero")]
    ZeroFrames,

    #[error("{band} band is empty or inverted: [{start}, {end})")]
    EmptyBand {
        band: &'static str,
        start: usize,
        end: usize,
    },

    #[error("Mid/low ratio ceiling must be positive, got {0}")]
    Ratio(f32),
}

/// Detector tuning, fixed for the duration of a lit session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowDetectionConfig {
    /// Normalized low-band average that must be exceeded (0-1]
    pub blow_threshold: f32,

    /// Frames of sustained blowing before the candles go out
    pub required_consecutive_frames: u32,

    pub low_band_start: usize,
    pub low_band_end: usize,
    pub mid_band_start: usize,
    pub mid_band_end: usize,

    /// Mid average must stay below `low_average * ceiling`
    pub mid_to_low_ratio_ceiling: f32,
}

impl Default for BlowDetectionConfig {
    fn default() -> Self {
        Self {
            blow_threshold: 0.5,
            required_consecutive_frames: 8,
            low_band_start: 0,
            low_band_end: 30,
            mid_band_start: 50,
            mid_band_end: 200,
            mid_to_low_ratio_ceiling: 0.6,
        }
    }
}

impl BlowDetectionConfig {
    /// Check a config that came from outside (the UI) before it replaces the
    /// active one. `detect` tolerates bad configs, this just reports them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.blow_threshold > 0.0 && self.blow_threshold <= 1.0) {
            return Err(ConfigError::Threshold(self.blow_threshold));
        }
        if self.required_consecutive_frames == 0 {
            return Err(ConfigError::ZeroFrames);
        }
        if self.low_band_start >= self.low_band_end {
            return Err(ConfigError::EmptyBand {
                band: "Low",
                start: self.low_band_start,
                end: self.low_band_end,
            });
        }
        if self.mid_band_start >= self.mid_band_end {
            return Err(ConfigError::EmptyBand {
                band: "Mid",
                start: self.mid_band_start,
                end: self.mid_band_end,
            });
        }
        if !(self.mid_to_low_ratio_ceiling > 0.0) {
            return Err(ConfigError::Ratio(self.mid_to_low_ratio_ceiling));
        }
        Ok(())
    }
}

/// Mutable debounce state, one per lit session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlowDetectionState {
    pub consecutive_blow_frames: u32,
}

impl BlowDetectionState {
    pub fn reset(&mut self) {
        self.consecutive_blow_frames = 0;
    }
}

/// Per-frame detector output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowDetection {
    pub is_blowing: bool,
    pub is_extinguished: bool,
}

impl BlowDetection {
    pub const INERT: Self = Self {
        is_blowing: false,
        is_extinguished: false,
    };
}

/// Normalized mean over `[start, end)`, with `end` clamped to the snapshot.
/// Returns `None` when the clamped band holds no bins.
fn band_average(snapshot: &[u8], start: usize, end: usize) -> Option<f32> {
    let end = end.min(snapshot.len());
    if start >= end {
        return None;
    }
    let sum: u32 = snapshot[start..end].iter().map(|&b| b as u32).sum();
    Some(sum as f32 / (end - start) as f32 / 255.0)
}

/// Classify one snapshot and advance the debounce counter.
///
/// The only side effect is on `state.consecutive_blow_frames`. Once this
/// returns `is_extinguished`, the caller is expected to stop feeding frames.
pub fn detect(
    snapshot: &[u8],
    config: &BlowDetectionConfig,
    state: &mut BlowDetectionState,
) -> BlowDetection {
    let (low_average, mid_average) = match (
        band_average(snapshot, config.low_band_start, config.low_band_end),
        band_average(snapshot, config.mid_band_start, config.mid_band_end),
    ) {
        (Some(low), Some(mid)) => (low, mid),
        _ => return BlowDetection::INERT,
    };

    let is_blow = low_average > config.blow_threshold
        && mid_average < low_average * config.mid_to_low_ratio_ceiling;

    if is_blow {
        state.consecutive_blow_frames = state.consecutive_blow_frames.saturating_add(1);
        BlowDetection {
            is_blowing: true,
            is_extinguished: state.consecutive_blow_frames > config.required_consecutive_frames,
        }
    } else {
        state.reset();
        BlowDetection::INERT
    }
}

/// Where a session sits in the light/blow/extinguish cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlowPhase {
    #[default]
    Unlit,
    Lit,
    Blowing,
    Extinguished,
}

/// Detector plus the session-level transitions around it.
///
/// `UNLIT -> LIT` on `light`, `LIT <-> BLOWING` per frame, `BLOWING ->
/// EXTINGUISHED` once the debounce is exceeded. A tracker covers one lit
/// session; relighting starts over with a new one.
#[derive(Debug, Clone)]
pub struct BlowTracker {
    config: BlowDetectionConfig,
    state: BlowDetectionState,
    phase: BlowPhase,
}

impl BlowTracker {
    pub fn new(config: BlowDetectionConfig) -> Self {
        Self {
            config,
            state: BlowDetectionState::default(),
            phase: BlowPhase::Unlit,
        }
    }

    pub fn phase(&self) -> BlowPhase {
        self.phase
    }

    pub fn light(&mut self) {
        if self.phase == BlowPhase::Unlit {
            self.state.reset();
            self.phase = BlowPhase::Lit;
        }
    }

    /// Feed one snapshot. Frames arriving while unlit or already extinguished
    /// are ignored and leave the counter alone.
    pub fn observe(&mut self, snapshot: &[u8]) -> BlowDetection {
        match self.phase {
            BlowPhase::Unlit => return BlowDetection::INERT,
            BlowPhase::Extinguished => {
                return BlowDetection {
                    is_blowing: false,
                    is_extinguished: true,
                }
            }
            BlowPhase::Lit | BlowPhase::Blowing => {}
        }

        let result = detect(snapshot, &self.config, &mut self.state);
        self.phase = if result.is_extinguished {
            BlowPhase::Extinguished
        } else if result.is_blowing {
            BlowPhase::Blowing
        } else {
            BlowPhase::Lit
        };
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINS: usize = 128;

    /// Snapshot whose low band averages `low` and mid band averages `mid`
    /// (both as byte values) under the default config.
    fn snapshot(low: u8, mid: u8) -> Vec<u8> {
        let mut data = vec![0u8; BINS];
        data[0..30].fill(low);
        data[50..BINS].fill(mid);
        data
    }

    fn scenario_config() -> BlowDetectionConfig {
        BlowDetectionConfig {
            blow_threshold: 0.5,
            required_consecutive_frames: 8,
            low_band_start: 0,
            low_band_end: 30,
            mid_band_start: 50,
            mid_band_end: 200,
            mid_to_low_ratio_ceiling: 0.6,
        }
    }

    #[test]
    fn detect_is_deterministic_for_equal_state() {
        let config = scenario_config();
        let frame = snapshot(180, 40);
        let start = BlowDetectionState {
            consecutive_blow_frames: 3,
        };

        let mut a = start;
        let mut b = start;
        let first = detect(&frame, &config, &mut a);
        let second = detect(&frame, &config, &mut b);

        assert_eq!(first, second);
        assert_eq!(a, b);
        assert_eq!(a.consecutive_blow_frames, 4);
    }

    #[test]
    fn extinguishes_only_after_required_frames_are_exceeded() {
        let config = scenario_config();
        let frame = snapshot(180, 40);
        let mut state = BlowDetectionState::default();

        for i in 1..=8 {
            let result = detect(&frame, &config, &mut state);
            assert!(result.is_blowing, "frame {} should be a blow", i);
            assert!(!result.is_extinguished, "frame {} should not extinguish", i);
        }

        let ninth = detect(&frame, &config, &mut state);
        assert!(ninth.is_extinguished);
        assert_eq!(state.consecutive_blow_frames, 9);

        let tenth = detect(&frame, &config, &mut state);
        assert!(tenth.is_extinguished);
    }

    #[test]
    fn single_quiet_frame_resets_counter() {
        let config = scenario_config();
        let mut state = BlowDetectionState {
            consecutive_blow_frames: 7,
        };

        let result = detect(&snapshot(10, 10), &config, &mut state);

        assert_eq!(result, BlowDetection::INERT);
        assert_eq!(state.consecutive_blow_frames, 0);
    }

    #[test]
    fn end_to_end_scenario_low_point_seven_mid_point_two() {
        // 0.7 * 255 = 178.5, 0.2 * 255 = 51
        let config = scenario_config();
        let mut data = vec![0u8; BINS];
        // alternate 178/179 so the low average is exactly 178.5
        for (i, bin) in data[0..30].iter_mut().enumerate() {
            *bin = if i % 2 == 0 { 178 } else { 179 };
        }
        data[50..BINS].fill(51);

        let mut state = BlowDetectionState::default();
        let results: Vec<_> = (0..9).map(|_| detect(&data, &config, &mut state)).collect();

        assert!(results[..8].iter().all(|r| r.is_blowing && !r.is_extinguished));
        assert!(results[8].is_extinguished);
    }

    #[test]
    fn end_to_end_scenario_mid_heavy_never_blows() {
        // low 0.7, mid 0.6: ratio 0.857 is above the 0.6 ceiling
        let config = scenario_config();
        let mut data = vec![0u8; BINS];
        for (i, bin) in data[0..30].iter_mut().enumerate() {
            *bin = if i % 2 == 0 { 178 } else { 179 };
        }
        data[50..BINS].fill(153);

        let mut state = BlowDetectionState::default();
        for _ in 0..9 {
            let result = detect(&data, &config, &mut state);
            assert!(!result.is_blowing);
            assert!(!result.is_extinguished);
        }
        assert_eq!(state.consecutive_blow_frames, 0);
    }

    #[test]
    fn below_threshold_is_not_a_blow() {
        let config = scenario_config();
        let mut state = BlowDetectionState::default();

        // 120 / 255 = 0.47
        let result = detect(&snapshot(120, 0), &config, &mut state);
        assert!(!result.is_blowing);
    }

    #[test]
    fn zero_width_band_is_inert() {
        let mut config = scenario_config();
        config.low_band_end = config.low_band_start;
        let mut state = BlowDetectionState {
            consecutive_blow_frames: 5,
        };

        let result = detect(&snapshot(255, 0), &config, &mut state);

        assert_eq!(result, BlowDetection::INERT);
        // inert short-circuit leaves the counter alone
        assert_eq!(state.consecutive_blow_frames, 5);
    }

    #[test]
    fn band_entirely_past_snapshot_is_inert() {
        let mut config = scenario_config();
        config.mid_band_start = 300;
        config.mid_band_end = 400;
        let mut state = BlowDetectionState::default();

        assert_eq!(detect(&snapshot(255, 0), &config, &mut state), BlowDetection::INERT);
    }

    #[test]
    fn empty_snapshot_is_inert() {
        let mut state = BlowDetectionState::default();
        assert_eq!(
            detect(&[], &BlowDetectionConfig::default(), &mut state),
            BlowDetection::INERT
        );
    }

    #[test]
    fn validate_rejects_bad_configs() {
        assert!(BlowDetectionConfig::default().validate().is_ok());

        let mut config = BlowDetectionConfig::default();
        config.blow_threshold = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::Threshold(0.0)));

        let mut config = BlowDetectionConfig::default();
        config.required_consecutive_frames = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroFrames));

        let mut config = BlowDetectionConfig::default();
        config.mid_band_start = 200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyBand { band: "Mid", .. })
        ));

        let mut config = BlowDetectionConfig::default();
        config.mid_to_low_ratio_ceiling = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Ratio(_))));
    }

    #[test]
    fn config_serializes_camel_case() {
        let json = serde_json::to_value(BlowDetectionConfig::default()).unwrap();
        assert_eq!(json["requiredConsecutiveFrames"], 8);
        assert_eq!(json["lowBandEnd"], 30);
    }

    #[test]
    fn tracker_walks_through_session_phases() {
        let mut tracker = BlowTracker::new(scenario_config());
        let blow = snapshot(200, 20);

        assert_eq!(tracker.phase(), BlowPhase::Unlit);
        assert_eq!(tracker.observe(&blow), BlowDetection::INERT);

        tracker.light();
        assert_eq!(tracker.phase(), BlowPhase::Lit);

        tracker.observe(&blow);
        assert_eq!(tracker.phase(), BlowPhase::Blowing);

        tracker.observe(&snapshot(0, 0));
        assert_eq!(tracker.phase(), BlowPhase::Lit);

        let mut last = BlowDetection::INERT;
        for _ in 0..9 {
            last = tracker.observe(&blow);
        }
        assert!(last.is_extinguished);
        assert_eq!(tracker.phase(), BlowPhase::Extinguished);

        // further frames do not move an extinguished session
        let after = tracker.observe(&snapshot(0, 0));
        assert!(after.is_extinguished);
        assert_eq!(tracker.phase(), BlowPhase::Extinguished);
    }

    #[test]
    fn light_only_leaves_unlit() {
        let mut tracker = BlowTracker::new(scenario_config());
        tracker.light();
        tracker.observe(&snapshot(200, 20));

        // a second light mid-blow keeps the streak going
        tracker.light();
        assert_eq!(tracker.phase(), BlowPhase::Blowing);
    }
}
