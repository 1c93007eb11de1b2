//! Launch controller: turns a config and an optional target into a rocket,
//! plus the queue that carries launch requests into the frame step.

use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;

use super::config::FireworkConfig;
use super::engine::{Point, Rocket, Viewport};

/// Aimed launches start within ±25% of the viewport width of the target.
const AIM_SPREAD: f64 = 0.5;

/// Build a rocket for `config`.
///
/// With a target the rocket follows a true ballistic arc that peaks exactly
/// at the target. A target at or below the launch line has no such arc and
/// falls back to an ambient launch.
pub fn plan(
    config: &FireworkConfig,
    target: Option<Point>,
    viewport: Viewport,
    gravity: f64,
    rng: &mut fastrand::Rng,
) -> Rocket {
    let config = config.clone().sanitized();
    match target {
        Some(target) => match aimed(config.clone(), target, viewport, gravity, rng) {
            Some(rocket) => rocket,
            None => {
                debug!("target ({:.0}, {:.0}) has no upward arc, launching ambient", target.x, target.y);
                ambient(config, viewport, rng)
            }
        },
        None => ambient(config, viewport, rng),
    }
}

fn aimed(
    config: FireworkConfig,
    target: Point,
    viewport: Viewport,
    gravity: f64,
    rng: &mut fastrand::Rng,
) -> Option<Rocket> {
    let width = viewport.width;
    let offset = (rng.f64() - 0.5) * (width * AIM_SPREAD);
    let start_x = (target.x + offset).clamp(width * 0.1, width * 0.9);
    let start_y = viewport.height;

    // v_y0 = -sqrt(2 g dy); apex time t = -v_y0 / g; v_x = dx / t
    let dy = (start_y - target.y).max(0.0);
    let vy = -(2.0 * gravity * dy).sqrt();
    let apex_time = -vy / gravity;
    if !apex_time.is_finite() || apex_time <= 0.0 {
        return None;
    }
    let vx = (target.x - start_x) / apex_time;

    Some(Rocket::new(start_x, start_y, vx, vy, target.y, config))
}

fn ambient(config: FireworkConfig, viewport: Viewport, rng: &mut fastrand::Rng) -> Rocket {
    let Viewport { width, height } = viewport;
    let start_x = rng.f64() * width * 0.8 + width * 0.1;
    let target_y = height * 0.15 + rng.f64() * height * 0.2;
    let vy = -(rng.f64() * 3.0 + 12.0);
    let vx = (rng.f64() - 0.5) * 2.0;

    Rocket::new(start_x, height, vx, vy, target_y, config)
}

/// A pending launch, produced by input handling, auto-fire or the recipe
/// designer and drained by the frame step.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub config: FireworkConfig,
    pub target: Option<Point>,
}

/// Producer half of the launch queue. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct LaunchSender {
    tx: Sender<LaunchRequest>,
}

impl LaunchSender {
    /// Returns `false` once the show has been torn down.
    pub fn send(&self, config: FireworkConfig, target: Option<Point>) -> bool {
        self.tx.send(LaunchRequest { config, target }).is_ok()
    }
}

/// Consumer half, owned by the frame task.
#[derive(Debug)]
pub struct LaunchQueue {
    rx: Receiver<LaunchRequest>,
}

impl LaunchQueue {
    /// Everything queued so far, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = LaunchRequest> + '_ {
        self.rx.try_iter()
    }
}

pub fn launch_queue() -> (LaunchSender, LaunchQueue) {
    let (tx, rx) = mpsc::channel();
    (LaunchSender { tx }, LaunchQueue { rx })
}
