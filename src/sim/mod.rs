pub mod autofire;
pub mod config;
pub mod engine;
pub mod launch;
pub mod shapes;

pub use autofire::AutoFire;
pub use config::{EngineSettings, FireworkConfig, PhysicsConfig, Preset, Shape, presets};
pub use engine::{Engine, Particle, Point, Rocket, StepReport, Viewport};
pub use launch::{LaunchQueue, LaunchRequest, LaunchSender, launch_queue};
pub use shapes::Fragment;
