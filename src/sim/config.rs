use crate::color::{self, Rgb, WHITE};

/// Upper bound applied to recipe and preset particle counts.
pub const MAX_BURST_PARTICLES: usize = 1000;

/// Explosion velocity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Sphere,
    Heart,
    Star,
    Willow,
    Ring,
}

impl Shape {
    pub const ALL: [Shape; 5] = [Shape::Sphere, Shape::Heart, Shape::Star, Shape::Willow, Shape::Ring];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Heart => "heart",
            Shape::Star => "star",
            Shape::Willow => "willow",
            Shape::Ring => "ring",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Per-burst physics, in logical pixels per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    /// Velocity multiplier applied each frame, in `(0, 1]`.
    pub friction: f64,
    pub gravity: f64,
    pub initial_velocity: f64,
    /// Alpha lost per frame, in `(0, 1)`.
    pub decay: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: 0.95,
            gravity: 0.04,
            initial_velocity: 6.0,
            decay: 0.015,
        }
    }
}

impl PhysicsConfig {
    /// Clamp every coefficient into its valid range.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f64, d: f64| if v.is_finite() { v } else { d };
        Self {
            friction: finite_or(self.friction, defaults.friction).clamp(0.01, 1.0),
            gravity: finite_or(self.gravity, defaults.gravity).max(0.0),
            initial_velocity: finite_or(self.initial_velocity, defaults.initial_velocity).max(0.0),
            decay: finite_or(self.decay, defaults.decay).clamp(0.0001, 0.99),
        }
    }
}

/// Everything needed to launch one firework and shape its burst.
///
/// A config is cloned into each rocket, so later edits to a preset never
/// reach a shell that is already in the air.
#[derive(Debug, Clone, PartialEq)]
pub struct FireworkConfig {
    pub name: Option<String>,
    /// Never empty once sanitized; `palette[0]` colours the rocket.
    pub palette: Vec<Rgb>,
    pub particle_count: usize,
    pub physics: PhysicsConfig,
    pub shape: Shape,
}

impl Default for FireworkConfig {
    fn default() -> Self {
        Self {
            name: None,
            palette: vec![(0xff, 0x00, 0x00), (0xff, 0xa5, 0x00), (0xff, 0xff, 0x00)],
            particle_count: 100,
            physics: PhysicsConfig::default(),
            shape: Shape::Sphere,
        }
    }
}

impl FireworkConfig {
    /// Substitute used when a recipe cannot be produced: one random colour,
    /// 100 particles, sphere, default physics.
    pub fn fallback(rng: &mut fastrand::Rng) -> Self {
        Self {
            name: None,
            palette: vec![color::random_rgb(rng)],
            particle_count: 100,
            physics: PhysicsConfig::default(),
            shape: Shape::Sphere,
        }
    }

    pub fn sanitized(mut self) -> Self {
        if self.palette.is_empty() {
            self.palette.push(WHITE);
        }
        self.particle_count = self.particle_count.clamp(1, MAX_BURST_PARTICLES);
        self.physics = self.physics.sanitized();
        self
    }

    /// The rocket's own colour.
    pub fn lead_color(&self) -> Rgb {
        self.palette.first().copied().unwrap_or(WHITE)
    }

    pub fn pick_color(&self, rng: &mut fastrand::Rng) -> Rgb {
        if self.palette.is_empty() {
            return WHITE;
        }
        self.palette[rng.usize(..self.palette.len())]
    }

    /// Variation applied to mouse launches: half the time a fresh vivid
    /// palette, velocity ×0.8..1.2, and a one-in-five chance of a star.
    pub fn varied_for_click(&self, rng: &mut fastrand::Rng) -> Self {
        let mut varied = self.clone();
        if rng.f64() <= 0.5 {
            varied.palette = vec![color::random_vivid(rng), color::random_vivid(rng), WHITE];
        }
        varied.physics.initial_velocity *= 0.8 + rng.f64() * 0.4;
        if rng.f64() > 0.8 {
            varied.shape = Shape::Star;
        }
        varied
    }

    /// Variation applied to auto-fire launches: velocity ×0.9..1.1.
    pub fn varied_for_show(&self, rng: &mut fastrand::Rng) -> Self {
        let mut varied = self.clone();
        varied.physics.initial_velocity *= 0.9 + rng.f64() * 0.2;
        varied
    }
}

/// Engine tunables shared by the launch controller and the frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Rocket gravity in logical pixels per frame squared. Aimed launches
    /// solve their arc with this same value.
    pub rocket_gravity: f64,
    /// A rocket at or above its target height explodes once its vertical
    /// velocity is above `-apex_tolerance`.
    pub apex_tolerance: f64,
    /// Chance per frame that an ascending rocket sheds a trail sparkle.
    pub sparkle_chance: f64,
    /// Live particle cap; the oldest particles are evicted first.
    pub max_particles: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rocket_gravity: 0.15,
            apex_tolerance: 2.0,
            sparkle_chance: 0.7,
            max_particles: 20_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub config: FireworkConfig,
}

fn preset(
    id: &'static str,
    name: &'static str,
    palette: &[Rgb],
    particle_count: usize,
    physics: PhysicsConfig,
    shape: Shape,
) -> Preset {
    Preset {
        id,
        name,
        config: FireworkConfig {
            name: Some(name.to_string()),
            palette: palette.to_vec(),
            particle_count,
            physics,
            shape,
        },
    }
}

/// Built-in shells, bound to keys `1`..`4`.
pub fn presets() -> Vec<Preset> {
    let base = PhysicsConfig::default();
    vec![
        preset(
            "classic",
            "Classic Multi",
            &[(0xef, 0x44, 0x44), (0x3b, 0x82, 0xf6), (0x22, 0xc5, 0x5e), WHITE],
            120,
            base,
            Shape::Sphere,
        ),
        preset(
            "golden_willow",
            "Golden Willow",
            &[(0xfb, 0xbf, 0x24), (0xd9, 0x77, 0x06)],
            150,
            PhysicsConfig { friction: 0.98, gravity: 0.02, decay: 0.008, ..base },
            Shape::Willow,
        ),
        preset(
            "love_heart",
            "Love Heart",
            &[(0xec, 0x48, 0x99), (0xf4, 0x72, 0xb6)],
            80,
            PhysicsConfig { friction: 0.94, ..base },
            Shape::Heart,
        ),
        preset(
            "neon_ring",
            "Neon Ring",
            &[(0x06, 0xb6, 0xd4), (0x8b, 0x5c, 0xf6)],
            100,
            PhysicsConfig { initial_velocity: 8.0, ..base },
            Shape::Ring,
        ),
    ]
}
