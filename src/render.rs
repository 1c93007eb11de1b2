use crate::canvas::Surface;
use crate::sim::Engine;

/// Share of the previous frame erased before new strokes are drawn.
pub const TRAIL_FADE: f32 = 0.1;
/// Rocket stroke width in logical pixels.
pub const ROCKET_WIDTH: f64 = 3.0;

/// Draws engine state onto a persistent surface, one frame at a time.
///
/// Simulation coordinates are logical pixels; `scale` logical pixels map to
/// one surface pixel.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    scale: f64,
    trail_fade: f32,
}

impl Renderer {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(f64::MIN_POSITIVE),
            trail_fade: TRAIL_FADE,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn project(&self, x: f64, y: f64) -> (f32, f32) {
        ((x / self.scale) as f32, (y / self.scale) as f32)
    }

    fn width(&self, logical: f64) -> f32 {
        (logical / self.scale) as f32
    }

    /// Fade what is already there, then stroke every rocket and particle from
    /// its previous to its current position.
    pub fn draw<S: Surface + ?Sized>(&self, engine: &Engine, surface: &mut S) {
        surface.fade(self.trail_fade);

        for rocket in engine.rockets() {
            surface.stroke_line(
                self.project(rocket.prev_x, rocket.prev_y),
                self.project(rocket.x, rocket.y),
                rocket.color,
                1.0,
                self.width(ROCKET_WIDTH),
            );
        }

        for particle in engine.particles() {
            surface.stroke_line(
                self.project(particle.prev_x, particle.prev_y),
                self.project(particle.x, particle.y),
                particle.color,
                particle.alpha as f32,
                self.width(particle.size),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::sim::{EngineSettings, FireworkConfig, Rocket, Viewport};

    #[derive(Debug, PartialEq)]
    enum Call {
        Fade(f32),
        Stroke { from: (f32, f32), to: (f32, f32), color: Rgb, alpha: f32, width: f32 },
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Surface for Recorder {
        fn size(&self) -> (usize, usize) {
            (100, 100)
        }

        fn resize(&mut self, _width: usize, _height: usize) {}

        fn fade(&mut self, amount: f32) {
            self.calls.push(Call::Fade(amount));
        }

        fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, alpha: f32, width: f32) {
            self.calls.push(Call::Stroke { from, to, color, alpha, width });
        }
    }

    fn settled_engine() -> Engine {
        let settings = EngineSettings { sparkle_chance: 0.0, ..EngineSettings::default() };
        let mut engine = Engine::with_rng(settings, Viewport::new(800.0, 600.0), fastrand::Rng::with_seed(1));
        let config = FireworkConfig { particle_count: 10, ..FireworkConfig::default() };
        // Nearly at apex so the first step bursts it.
        engine.push_rocket(Rocket::new(400.0, 200.0, 0.0, -0.1, 100.0, config.clone()));
        engine.push_rocket(Rocket::new(100.0, 600.0, 1.0, -12.0, 100.0, config));
        engine.step();
        engine
    }

    #[test]
    fn fades_before_drawing_anything() {
        let engine = settled_engine();
        let mut surface = Recorder::default();
        Renderer::new(1.0).draw(&engine, &mut surface);

        assert_eq!(surface.calls[0], Call::Fade(TRAIL_FADE));
        assert!(surface.calls[1..].iter().all(|c| matches!(c, Call::Stroke { .. })));
        assert_eq!(surface.calls.len(), 1 + engine.rockets().len() + engine.particles().len());
    }

    #[test]
    fn particles_stroke_with_their_alpha_and_size() {
        let engine = settled_engine();
        let mut surface = Recorder::default();
        Renderer::new(2.0).draw(&engine, &mut surface);

        let rocket = &engine.rockets()[0];
        assert_eq!(
            surface.calls[1],
            Call::Stroke {
                from: ((rocket.prev_x / 2.0) as f32, (rocket.prev_y / 2.0) as f32),
                to: ((rocket.x / 2.0) as f32, (rocket.y / 2.0) as f32),
                color: rocket.color,
                alpha: 1.0,
                width: 1.5,
            }
        );

        for (call, particle) in surface.calls[2..].iter().zip(engine.particles()) {
            let Call::Stroke { alpha, width, color, .. } = call else {
                panic!("expected a stroke");
            };
            assert_eq!(*alpha, particle.alpha as f32);
            assert_eq!(*width, (particle.size / 2.0) as f32);
            assert_eq!(*color, particle.color);
            assert!(*alpha > 0.0 && *alpha <= 1.0);
        }
    }
}
