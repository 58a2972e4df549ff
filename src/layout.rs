//! Candle layout - places candles on the cake artwork in percent units
//!
//! Layouts are pure functions of their inputs. The same inputs always produce
//! the same placements (jitter included), so a layout can be recomputed on any
//! render pass and come out identical.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Horizontal distance between digit candles
pub const DIGIT_SPACING_PERCENT: f32 = 12.0;

/// Classic candle count bounds
pub const MIN_CANDLES: u32 = 1;
pub const MAX_CANDLES: u32 = 100;

/// Vertical step between rings (perspective depth)
const RING_DEPTH_PERCENT: f32 = 2.0;

/// Jitter quantum; offsets land on multiples of this up to three steps
const JITTER_STEP: f32 = 0.25;

/// Where on the artwork candles cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CakeGeometry {
    /// Distance from the top of the container
    pub base_y_percent: f32,

    /// Width of the area candles may spread across
    pub base_width_percent: f32,
}

/// Classic candles or one numeral candle per digit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleMode {
    #[default]
    Classic,
    Digits,
}

/// One candle on screen. Position is the candle's base, in percent of the
/// container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandlePlacement {
    pub id: String,
    pub x_percent: f32,
    pub y_percent: f32,
    pub label: Option<String>,
}

/// Layout input, already validated by the caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CandleSpec<'a> {
    Classic { count: u32 },
    Digits { digits: &'a str },
}

/// Compute a full layout. Vector order is render order: later entries draw on
/// top.
pub fn layout_candles(spec: CandleSpec<'_>, geometry: CakeGeometry) -> Vec<CandlePlacement> {
    match spec {
        CandleSpec::Classic { count } => layout_classic(count, geometry),
        CandleSpec::Digits { digits } => layout_digits(digits, geometry),
    }
}

/// One candle per character, centered on 50% and evenly spaced
pub fn layout_digits(digits: &str, geometry: CakeGeometry) -> Vec<CandlePlacement> {
    let len = digits.chars().count();
    let center = (len as f32 - 1.0) / 2.0;

    digits
        .chars()
        .enumerate()
        .map(|(i, ch)| CandlePlacement {
            id: format!("d-{}", i),
            x_percent: 50.0 + (i as f32 - center) * DIGIT_SPACING_PERCENT,
            y_percent: geometry.base_y_percent,
            label: Some(ch.to_string()),
        })
        .collect()
}

/// Number of concentric rings for `count` candles
fn ring_count(count: u32) -> usize {
    ((count as f32 / 6.0).sqrt().floor() as usize).max(1)
}

/// Candles per ring: two in the middle, roughly six more per ring outward,
/// and whatever is left piles onto the outermost ring.
pub fn ring_populations(count: u32) -> Vec<u32> {
    let rings = ring_count(count);
    let mut remaining = count;
    let mut populations = Vec::with_capacity(rings);

    for k in 0..rings {
        let want = if k == 0 {
            2
        } else {
            (6.0 * k as f32).round() as u32
        };
        let take = want.min(remaining);
        populations.push(take);
        remaining -= take;
    }

    if let Some(last) = populations.last_mut() {
        *last += remaining;
    }

    populations
}

/// Zig-zag a small bucket index onto {0, +1, -1, +2, -2, +3, -3} steps
fn zigzag_offset(bucket: u32) -> f32 {
    let steps = ((bucket + 1) / 2) as f32;
    let sign = if bucket % 2 == 1 { 1.0 } else { -1.0 };
    sign * steps * JITTER_STEP
}

/// Deterministic hand-placed wobble for candle `i` on ring `k`, within
/// +/-0.75 on each axis. Both offsets are zero for the first candle of the
/// innermost ring.
fn jitter(i: usize, k: usize) -> (f32, f32) {
    let (i, k) = (i as u32, k as u32);
    let hx = i.wrapping_mul(73_856_093) ^ k.wrapping_mul(19_349_663);
    let hy = i.wrapping_mul(19_349_663) ^ k.wrapping_mul(83_492_791);
    (zigzag_offset(hx % 7), zigzag_offset(hy % 7))
}

/// Concentric-ring layout for plain candles. `count` is clamped to 1..=100.
pub fn layout_classic(count: u32, geometry: CakeGeometry) -> Vec<CandlePlacement> {
    let count = count.clamp(MIN_CANDLES, MAX_CANDLES);
    let half_width = geometry.base_width_percent / 2.0;
    let mut placements = Vec::with_capacity(count as usize);

    for (k, &population) in ring_populations(count).iter().enumerate() {
        if population == 0 {
            continue;
        }
        let radius = half_width * (0.3 + 0.4 * k as f32);

        for i in 0..population as usize {
            let angle = i as f32 / population as f32 * 2.0 * PI;
            let (jx, jy) = jitter(i, k);
            placements.push(CandlePlacement {
                id: format!("c-{}", placements.len()),
                x_percent: 50.0 + angle.cos() * radius + jx,
                y_percent: geometry.base_y_percent + RING_DEPTH_PERCENT * k as f32 + jy,
                label: None,
            });
        }
    }

    placements
}
