use log::{debug, trace};

use super::config::{EngineSettings, FireworkConfig, PhysicsConfig};
use super::launch;
use super::shapes;
use crate::color::Rgb;

/// Alpha at or below this counts as fully faded.
const ALPHA_EPSILON: f64 = 1e-9;
/// Extra damping for flickering particles, subtracted from the friction factor.
const FLICKER_DRAG: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Logical drawing area. Rockets start on the bottom edge (`y = height`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An ascending shell. Owns its own copy of the config it will burst with.
#[derive(Debug, Clone)]
pub struct Rocket {
    pub x: f64,
    pub y: f64,
    pub prev_x: f64,
    pub prev_y: f64,
    pub vx: f64,
    pub vy: f64,
    pub target_y: f64,
    pub color: Rgb,
    pub config: FireworkConfig,
}

impl Rocket {
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, target_y: f64, config: FireworkConfig) -> Self {
        Self {
            x,
            y,
            prev_x: x,
            prev_y: y,
            vx,
            vy,
            target_y,
            color: config.lead_color(),
            config,
        }
    }

    /// One frame under constant gravity. The half-step term makes the
    /// position exact for constant acceleration, so an aimed rocket tops out
    /// at its target height instead of overshooting by `|vy|/2`.
    fn advance(&mut self, gravity: f64) {
        self.prev_x = self.x;
        self.prev_y = self.y;

        self.x += self.vx;
        self.y += self.vy + gravity * 0.5;
        self.vy += gravity;
    }

    /// Apex trigger: at/above the target while nearly stalled, or falling.
    fn should_explode(&self, apex_tolerance: f64) -> bool {
        let reached_target = self.y <= self.target_y && self.vy > -apex_tolerance;
        let past_apex = self.vy >= 0.0;
        reached_target || past_apex
    }
}

/// A fading fragment drawn as a segment from its previous to current position.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub prev_x: f64,
    pub prev_y: f64,
    pub vx: f64,
    pub vy: f64,
    pub color: Rgb,
    /// Opacity, doubling as remaining life.
    pub alpha: f64,
    pub decay: f64,
    pub size: f64,
    /// Flickering sparks damp faster.
    pub flicker: bool,
    friction: f64,
    gravity: f64,
}

impl Particle {
    fn burst(origin: Point, fragment: shapes::Fragment, config: &FireworkConfig, rng: &mut fastrand::Rng) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            prev_x: origin.x,
            prev_y: origin.y,
            vx: fragment.vx,
            vy: fragment.vy,
            color: config.pick_color(rng),
            alpha: 1.0,
            decay: fragment.decay,
            size: 1.0 + rng.f64() * 2.0,
            flicker: rng.bool(),
            friction: config.physics.friction,
            gravity: config.physics.gravity,
        }
    }

    /// Short-lived spark shed by an ascending rocket.
    fn sparkle(rocket: &Rocket, rng: &mut fastrand::Rng) -> Self {
        let physics = PhysicsConfig::default();
        Self {
            x: rocket.x,
            y: rocket.y,
            prev_x: rocket.x,
            prev_y: rocket.y,
            vx: rng.f64() - 0.5,
            vy: 0.5 + rng.f64(),
            color: rocket.color,
            alpha: 0.8,
            decay: 0.03 + rng.f64() * 0.03,
            size: rng.f64() * 2.0,
            flicker: true,
            friction: physics.friction,
            gravity: physics.gravity,
        }
    }

    pub fn damping(&self) -> f64 {
        if self.flicker {
            (self.friction - FLICKER_DRAG).max(0.0)
        } else {
            self.friction
        }
    }

    fn advance(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;

        let damping = self.damping();
        self.vx *= damping;
        self.vy *= damping;
        self.vy += self.gravity;

        self.x += self.vx;
        self.y += self.vy;
        self.alpha -= self.decay;
    }

    pub fn is_expired(&self) -> bool {
        self.alpha <= ALPHA_EPSILON
    }
}

/// What happened during one [`Engine::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub exploded: usize,
    pub spawned: usize,
    pub expired: usize,
    pub evicted: usize,
}

/// Owns every live rocket and particle. The frame step is the only mutator.
pub struct Engine {
    settings: EngineSettings,
    viewport: Viewport,
    rockets: Vec<Rocket>,
    particles: Vec<Particle>,
    rng: fastrand::Rng,
    frame: u64,
    launched: u64,
}

impl Engine {
    pub fn new(settings: EngineSettings, viewport: Viewport) -> Self {
        Self::with_rng(settings, viewport, fastrand::Rng::new())
    }

    pub fn with_rng(settings: EngineSettings, viewport: Viewport, rng: fastrand::Rng) -> Self {
        Self {
            settings,
            viewport,
            rockets: Vec::new(),
            particles: Vec::new(),
            rng,
            frame: 0,
            launched: 0,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn rockets(&self) -> &[Rocket] {
        &self.rockets
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Rockets launched since the engine was created.
    pub fn launched(&self) -> u64 {
        self.launched
    }

    /// Only the viewport changes; in-flight entities keep their coordinates.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn clear(&mut self) {
        self.rockets.clear();
        self.particles.clear();
    }

    /// Launch a rocket, aimed at `target` when given.
    pub fn launch(&mut self, config: &FireworkConfig, target: Option<Point>) {
        let rocket = launch::plan(
            config,
            target,
            self.viewport,
            self.settings.rocket_gravity,
            &mut self.rng,
        );
        debug!(
            "launch {} ({:?}, {} particles) from x={:.0} toward y={:.0}",
            config.name.as_deref().unwrap_or("custom"),
            rocket.config.shape,
            rocket.config.particle_count,
            rocket.x,
            rocket.target_y
        );
        self.push_rocket(rocket);
    }

    pub fn push_rocket(&mut self, rocket: Rocket) {
        self.launched += 1;
        self.rockets.push(rocket);
    }

    /// Advance one display frame: rockets (and their bursts) first, then
    /// particles.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport::default();
        self.frame += 1;

        let gravity = self.settings.rocket_gravity;
        let rockets = std::mem::take(&mut self.rockets);
        for mut rocket in rockets {
            rocket.advance(gravity);

            if self.rng.f64() < self.settings.sparkle_chance {
                self.particles.push(Particle::sparkle(&rocket, &mut self.rng));
                report.spawned += 1;
            }

            if rocket.should_explode(self.settings.apex_tolerance) {
                report.spawned += self.explode(rocket);
                report.exploded += 1;
            } else {
                self.rockets.push(rocket);
            }
        }

        report.evicted = self.enforce_capacity();

        let before = self.particles.len();
        self.particles.retain_mut(|particle| {
            particle.advance();
            !particle.is_expired()
        });
        report.expired = before - self.particles.len();

        report
    }

    /// Consume a rocket and append its burst; returns the burst size.
    fn explode(&mut self, rocket: Rocket) -> usize {
        let origin = Point::new(rocket.x, rocket.y);
        let config = rocket.config;
        let fragments = shapes::burst(&config, &mut self.rng);
        let count = fragments.len();

        trace!(
            "burst {:?} x{} at ({:.0}, {:.0}) frame {}",
            config.shape, count, origin.x, origin.y, self.frame
        );

        self.particles.reserve(count);
        for fragment in fragments {
            self.particles.push(Particle::burst(origin, fragment, &config, &mut self.rng));
        }
        count
    }

    fn enforce_capacity(&mut self) -> usize {
        let excess = self.particles.len().saturating_sub(self.settings.max_particles);
        if excess > 0 {
            self.particles.drain(..excess);
            debug!("particle cap {} reached, evicted {excess}", self.settings.max_particles);
        }
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::Shape;

    fn quiet_settings() -> EngineSettings {
        EngineSettings { sparkle_chance: 0.0, ..EngineSettings::default() }
    }

    fn engine(settings: EngineSettings) -> Engine {
        Engine::with_rng(settings, Viewport::new(800.0, 600.0), fastrand::Rng::with_seed(9))
    }

    fn lone_particle(decay: f64) -> Particle {
        Particle {
            x: 0.0,
            y: 0.0,
            prev_x: 0.0,
            prev_y: 0.0,
            vx: 1.0,
            vy: -1.0,
            color: (255, 255, 255),
            alpha: 1.0,
            decay,
            size: 1.0,
            flicker: false,
            friction: 0.95,
            gravity: 0.04,
        }
    }

    #[test]
    fn particle_expires_after_ceil_inverse_decay_frames() {
        for decay in [0.1, 0.25, 0.3, 0.015, 0.008, 0.5, 0.07] {
            let mut engine = engine(quiet_settings());
            engine.particles.push(lone_particle(decay));

            let mut frames = 0;
            while !engine.particles.is_empty() {
                engine.step();
                frames += 1;
                for p in engine.particles() {
                    assert!(p.alpha > 0.0, "negative alpha observed");
                }
                assert!(frames < 10_000);
            }
            assert_eq!(frames, (1.0 / decay).ceil() as usize, "decay {decay}");
        }
    }

    #[test]
    fn flicker_damps_harder() {
        let mut steady = lone_particle(0.01);
        let mut flicker = lone_particle(0.01);
        flicker.flicker = true;
        assert!(flicker.damping() < steady.damping());

        steady.advance();
        flicker.advance();
        assert!(flicker.vx.abs() < steady.vx.abs());
        assert_eq!((steady.prev_x, steady.prev_y), (0.0, 0.0));
    }

    #[test]
    fn particle_velocity_decays_with_friction_below_one() {
        let mut p = lone_particle(0.0001);
        p.gravity = 0.0;
        let start = p.vx.hypot(p.vy);
        for _ in 0..200 {
            p.advance();
        }
        assert!(p.vx.hypot(p.vy) < start * 1e-3);
    }

    #[test]
    fn ballistic_launch_stalls_at_target_height() {
        let g: f64 = 0.15;
        let dy = 300.0;
        let mut rocket = Rocket::new(0.0, 600.0, 0.0, -(2.0 * g * dy).sqrt(), 0.0, FireworkConfig::default());
        let mut highest = rocket.y;
        while rocket.vy < 0.0 {
            rocket.advance(g);
            highest = highest.min(rocket.y);
        }
        // Within one frame's travel of the analytic apex.
        assert!((600.0 - highest - dy).abs() < g * 2.0, "apex at {}", 600.0 - highest);
    }

    #[test]
    fn rocket_explodes_once_and_spawns_its_burst() {
        let mut engine = engine(quiet_settings());
        let config = FireworkConfig { particle_count: 64, shape: Shape::Ring, ..FireworkConfig::default() };
        engine.push_rocket(Rocket::new(400.0, 600.0, 0.0, -6.0, 100.0, config));

        let mut exploded = 0;
        let mut spawned = 0;
        for _ in 0..200 {
            let report = engine.step();
            exploded += report.exploded;
            spawned += report.spawned;
            if report.exploded > 0 {
                assert!(engine.rockets().is_empty());
            }
        }
        assert_eq!(exploded, 1);
        assert_eq!(spawned, 64);
    }

    #[test]
    fn height_clause_triggers_near_apex() {
        let mut rocket = Rocket::new(0.0, 600.0, 0.0, -1.5, 600.0, FireworkConfig::default());
        rocket.advance(0.15);
        // Already above the target and slower than the tolerance.
        assert!(rocket.should_explode(2.0));

        let mut fast = Rocket::new(0.0, 600.0, 0.0, -10.0, 600.0, FireworkConfig::default());
        fast.advance(0.15);
        assert!(!fast.should_explode(2.0));
    }

    #[test]
    fn ascending_rockets_shed_sparkles() {
        let mut engine = engine(EngineSettings { sparkle_chance: 1.0, ..EngineSettings::default() });
        engine.push_rocket(Rocket::new(400.0, 600.0, 0.0, -12.0, 0.0, FireworkConfig::default()));
        let report = engine.step();
        assert_eq!(report.spawned, 1);
        let sparkle = &engine.particles()[0];
        assert!(sparkle.flicker);
        assert!(sparkle.vy > 0.0, "sparkles drift down");
        assert!(sparkle.alpha < 0.8);
    }

    #[test]
    fn sparkle_rate_matches_the_setting() {
        let mut engine = engine(EngineSettings::default());
        // Far too fast and too high a target to burst within the run.
        engine.push_rocket(Rocket::new(400.0, 600.0, 0.0, -1.0e6, -1.0e12, FireworkConfig::default()));

        let frames = 4000;
        let mut sparkles = 0;
        for _ in 0..frames {
            let report = engine.step();
            assert_eq!(report.exploded, 0);
            sparkles += report.spawned;
        }
        let rate = sparkles as f64 / frames as f64;
        assert!((rate - engine.settings().sparkle_chance).abs() < 0.04, "sparkle rate {rate}");
    }

    #[test]
    fn frames_count_steps_until_cleared_and_beyond() {
        let mut engine = engine(quiet_settings());
        engine.launch(&FireworkConfig::default(), None);
        for _ in 0..5 {
            engine.step();
        }
        engine.clear();
        engine.step();
        assert_eq!(engine.frame(), 6);
        assert_eq!(engine.launched(), 1);
        assert_eq!(engine.settings().sparkle_chance, 0.0);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut engine = engine(EngineSettings { max_particles: 10, ..quiet_settings() });
        for i in 0..15 {
            let mut p = lone_particle(0.001);
            p.x = i as f64;
            engine.particles.push(p);
        }
        let report = engine.step();
        assert_eq!(report.evicted, 5);
        assert_eq!(engine.particles().len(), 10);
        assert_eq!(engine.particles()[0].prev_x, 5.0);
    }

    #[test]
    fn removal_keeps_survivors_in_order() {
        let mut engine = engine(quiet_settings());
        for (i, decay) in [0.6, 0.1, 0.6, 0.1, 0.6].into_iter().enumerate() {
            let mut p = lone_particle(decay);
            p.x = i as f64 * 10.0;
            engine.particles.push(p);
        }
        engine.step();
        engine.step();
        let survivors = engine.particles();
        assert_eq!(survivors.len(), 2);
        assert!(survivors.iter().all(|p| p.decay == 0.1));
        assert!(survivors[0].x < survivors[1].x);
    }

    #[test]
    fn resize_leaves_entities_alone() {
        let mut engine = engine(quiet_settings());
        engine.launch(&FireworkConfig::default(), None);
        let before = (engine.rockets()[0].x, engine.rockets()[0].y);
        engine.resize(Viewport::new(100.0, 100.0));
        assert_eq!((engine.rockets()[0].x, engine.rockets()[0].y), before);
        assert_eq!(engine.viewport(), Viewport::new(100.0, 100.0));
    }
}
