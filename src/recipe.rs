//! Boundary to whatever designs firework recipes from a text prompt.
//!
//! A designer answers with a flat JSON object:
//!
//! ```json
//! { "colors": ["#fbbf24", "hsl(40, 100%, 60%)"], "particleCount": 180,
//!   "shape": "willow", "friction": 0.98, "gravity": 0.02,
//!   "decay": 0.008, "initialVelocity": 5 }
//! ```
//!
//! Missing fields take defaults and out-of-range values are clamped, so the
//! engine only ever sees a complete config. A designer that fails outright is
//! replaced by [`FireworkConfig::fallback`] in [`design`].

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::color::{self, WHITE};
use crate::sim::{FireworkConfig, PhysicsConfig, Shape};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecipeError {
    #[error("failed to read recipe: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse recipe JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("designer `{program}` exited with {status}: {stderr}")]
    Designer {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("designer command is empty")]
    EmptyCommand,
}

/// Anything that can turn a description into a config.
pub trait RecipeSource {
    fn generate(&mut self, prompt: &str) -> Result<FireworkConfig, RecipeError>;
}

/// Ask `source` for a recipe, substituting the fallback config on any error.
pub fn design<S: RecipeSource + ?Sized>(source: &mut S, prompt: &str, rng: &mut fastrand::Rng) -> FireworkConfig {
    match source.generate(prompt) {
        Ok(config) => {
            let palette: Vec<_> = config.palette.iter().map(|c| color::to_hex(*c)).collect();
            info!(
                "designed {} ({} particles, {}, palette {})",
                config.name.as_deref().unwrap_or("recipe"),
                config.particle_count,
                config.shape.name(),
                palette.join(" ")
            );
            config
        }
        Err(e) => {
            warn!("recipe designer failed, using fallback: {e}");
            FireworkConfig::fallback(rng)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    name: Option<String>,
    colors: Option<Vec<String>>,
    particle_count: Option<f64>,
    shape: Option<String>,
    friction: Option<f64>,
    gravity: Option<f64>,
    decay: Option<f64>,
    initial_velocity: Option<f64>,
}

impl RawRecipe {
    fn into_config(self) -> FireworkConfig {
        let defaults = PhysicsConfig::default();
        // Zero counts as "not provided", as in the designer's schema.
        let or_default = |v: Option<f64>, d: f64| v.filter(|v| *v != 0.0).unwrap_or(d);

        let palette: Vec<_> = self
            .colors
            .unwrap_or_default()
            .iter()
            .filter_map(|c| match color::parse_color(c) {
                Ok(rgb) => Some(rgb),
                Err(e) => {
                    warn!("dropping recipe color {c:?}: {e}");
                    None
                }
            })
            .collect();

        let shape = match self.shape.as_deref() {
            None => Shape::Sphere,
            Some(name) => Shape::from_name(name).unwrap_or_else(|| {
                warn!("unknown recipe shape {name:?}, using sphere");
                Shape::Sphere
            }),
        };

        let particle_count = or_default(self.particle_count, 100.0);
        FireworkConfig {
            name: self.name,
            palette: if palette.is_empty() { vec![WHITE] } else { palette },
            particle_count: if particle_count.is_finite() { particle_count.round().max(0.0) as usize } else { 100 },
            physics: PhysicsConfig {
                friction: or_default(self.friction, defaults.friction),
                gravity: or_default(self.gravity, defaults.gravity),
                initial_velocity: or_default(self.initial_velocity, defaults.initial_velocity),
                decay: or_default(self.decay, defaults.decay),
            },
            shape,
        }
        .sanitized()
    }
}

/// Parse a designer's JSON answer into a complete, clamped config.
pub fn parse_recipe(json: &str) -> Result<FireworkConfig, RecipeError> {
    let raw: RawRecipe = serde_json::from_str(json.trim())?;
    Ok(raw.into_config())
}

/// A fixed recipe on disk; the prompt is ignored.
#[derive(Debug, Clone)]
pub struct RecipeFile {
    path: PathBuf,
}

impl RecipeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecipeSource for RecipeFile {
    fn generate(&mut self, _prompt: &str) -> Result<FireworkConfig, RecipeError> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_recipe(&text)
    }
}

/// Runs an external designer (for example a script calling a hosted model)
/// with the prompt as its final argument and reads recipe JSON from stdout.
#[derive(Debug, Clone)]
pub struct CommandDesigner {
    program: String,
    args: Vec<String>,
}

impl CommandDesigner {
    /// Split a command line on whitespace into program and leading arguments.
    pub fn from_command_line(command: &str) -> Result<Self, RecipeError> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(RecipeError::EmptyCommand)?;
        Ok(Self { program, args: words.collect() })
    }
}

impl RecipeSource for CommandDesigner {
    fn generate(&mut self, prompt: &str) -> Result<FireworkConfig, RecipeError> {
        let output = Command::new(&self.program).args(&self.args).arg(prompt).output()?;
        if !output.status.success() {
            return Err(RecipeError::Designer {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_recipe(&String::from_utf8_lossy(&output.stdout))
    }
}
