use log::debug;

/// Seconds between ambient launches are drawn uniformly from this range.
const MIN_INTERVAL: f64 = 0.6;
const MAX_INTERVAL: f64 = 1.4;

/// Ambient launch timer, driven by the simulation clock.
///
/// The pending deadline is the timer handle: disabling drops it, after which
/// [`AutoFire::advance`] can never fire until the timer is enabled again.
#[derive(Debug, Default)]
pub struct AutoFire {
    clock: f64,
    next_fire: Option<f64>,
}

impl AutoFire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn set_enabled(&mut self, enabled: bool, rng: &mut fastrand::Rng) {
        match (enabled, self.next_fire) {
            (true, None) => {
                self.next_fire = Some(self.clock + Self::interval(rng));
                debug!("auto-fire on");
            }
            (false, Some(_)) => {
                self.next_fire = None;
                debug!("auto-fire off");
            }
            _ => {}
        }
    }

    pub fn toggle(&mut self, rng: &mut fastrand::Rng) -> bool {
        let enabled = !self.is_enabled();
        self.set_enabled(enabled, rng);
        enabled
    }

    /// Advance the clock by `dt` seconds; true when a launch is due.
    pub fn advance(&mut self, dt: f64, rng: &mut fastrand::Rng) -> bool {
        self.clock += dt;
        match self.next_fire {
            Some(deadline) if self.clock >= deadline => {
                self.next_fire = Some(self.clock + Self::interval(rng));
                true
            }
            _ => false,
        }
    }

    fn interval(rng: &mut fastrand::Rng) -> f64 {
        MIN_INTERVAL + rng.f64() * (MAX_INTERVAL - MIN_INTERVAL)
    }
}
