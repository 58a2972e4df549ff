//! Confetti burst shown once the candles are out

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PARTICLE_COUNT: usize = 150;

pub const CONFETTI_COLORS: [&str; 6] = [
    "#f43f5e", "#ec4899", "#d946ef", "#a855f7", "#8b5cf6", "#fbbf24",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfettiParticle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: String,
    /// Degrees
    pub rotation: f32,
    pub rotation_speed: f32,
}

/// Particles launched from just above the middle of a `width` x `height`
/// canvas, mostly upward
pub fn burst<R: Rng>(rng: &mut R, width: f32, height: f32) -> Vec<ConfettiParticle> {
    (0..PARTICLE_COUNT)
        .map(|_| ConfettiParticle {
            x: width / 2.0,
            y: height * 0.4,
            vx: (rng.random::<f32>() - 0.5) * 20.0,
            vy: (rng.random::<f32>() - 0.8) * 15.0,
            size: rng.random::<f32>() * 8.0 + 4.0,
            color: CONFETTI_COLORS[rng.random_range(0..CONFETTI_COLORS.len())].to_string(),
            rotation: rng.random::<f32>() * 360.0,
            rotation_speed: rng.random::<f32>() * 10.0 - 5.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn burst_starts_at_launch_point_with_bounded_values() {
        let mut rng = StdRng::seed_from_u64(7);
        let particles = burst(&mut rng, 1000.0, 800.0);

        assert_eq!(particles.len(), PARTICLE_COUNT);
        for p in &particles {
            assert_eq!((p.x, p.y), (500.0, 320.0));
            assert!(p.vx >= -10.0 && p.vx <= 10.0);
            assert!(p.vy >= -12.0 && p.vy <= 3.0);
            assert!(p.size >= 4.0 && p.size <= 12.0);
            assert!(CONFETTI_COLORS.contains(&p.color.as_str()));
        }
    }

    #[test]
    fn same_seed_same_burst() {
        let a = burst(&mut StdRng::seed_from_u64(1), 640.0, 480.0);
        let b = burst(&mut StdRng::seed_from_u64(1), 640.0, 480.0);
        assert_eq!(a, b);
    }
}
