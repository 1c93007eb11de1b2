//! Burst velocity fields.
//!
//! Each explosion asks for one [`Fragment`] per particle. Sphere, willow and
//! ring ignore the particle index; heart and star use `index / total` to place
//! the particle on their outline.

use std::f64::consts::{FRAC_PI_2, TAU};

use super::config::{FireworkConfig, Shape};

/// Willow shells leave the burst at this fraction of the configured speed.
const WILLOW_SPEED: f64 = 0.6;
const HEART_SCALE: f64 = 0.15;
const STAR_SPIKES: usize = 5;
/// Half-width of the random angular spread around each star spike.
const STAR_JITTER: f64 = 0.25;

/// Initial motion of one burst particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub vx: f64,
    pub vy: f64,
    /// Alpha lost per frame.
    pub decay: f64,
}

impl Fragment {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// Velocity and decay for particle `index` of a `total`-particle burst.
///
/// Called exactly `total` times per explosion with `index` in `0..total`.
pub fn generate(index: usize, total: usize, config: &FireworkConfig, rng: &mut fastrand::Rng) -> Fragment {
    let physics = &config.physics;
    let willow = config.shape == Shape::Willow;
    let base_velocity = if willow {
        physics.initial_velocity * WILLOW_SPEED
    } else {
        physics.initial_velocity
    };

    let angle = rng.f64() * TAU;
    let velocity = rng.f64() * base_velocity;

    let (vx, vy) = match config.shape {
        Shape::Sphere | Shape::Willow => (angle.cos() * velocity, angle.sin() * velocity),
        Shape::Heart => {
            let t = index as f64 / total.max(1) as f64 * TAU;
            let (hx, hy) = heart_point(t);
            let scale = velocity * HEART_SCALE;
            (hx * scale, hy * scale)
        }
        Shape::Ring => {
            let speed = physics.initial_velocity * (0.9 + rng.f64() * 0.1);
            (angle.cos() * speed, angle.sin() * speed)
        }
        Shape::Star => {
            let spread = (rng.f64() - 0.5) * (STAR_JITTER * 2.0);
            let final_angle = star_spike_angle(index, total) + spread;
            let speed = physics.initial_velocity * (0.5 + rng.f64() * 0.8);
            (final_angle.cos() * speed, final_angle.sin() * speed)
        }
    };

    let decay = if willow {
        physics.decay * 0.5
    } else {
        physics.decay * (0.8 + rng.f64() * 0.4)
    };

    Fragment { vx, vy, decay }
}

/// Generate a whole burst, in index order.
pub fn burst(config: &FireworkConfig, rng: &mut fastrand::Rng) -> Vec<Fragment> {
    let total = config.particle_count;
    (0..total).map(|i| generate(i, total, config, rng)).collect()
}

/// Classic parametric heart, screen-space (y grows downward so the lobes
/// point up).
pub fn heart_point(t: f64) -> (f64, f64) {
    let x = 16.0 * t.sin().powi(3);
    let y = -(13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos());
    (x, y)
}

/// Base angle of the spike that particle `index` belongs to, before jitter.
///
/// Particles are split into five contiguous index ranges; the first spike
/// points straight up.
pub fn star_spike_angle(index: usize, total: usize) -> f64 {
    let spike = (index * STAR_SPIKES / total.max(1)).min(STAR_SPIKES - 1);
    spike as f64 * (TAU / STAR_SPIKES as f64) - FRAC_PI_2
}
