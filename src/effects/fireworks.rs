use super::Effect;
use crate::canvas::{Canvas, Surface};
use crate::color::Rgb;
use crate::recipe::{self, RecipeSource};
use crate::render::Renderer;
use crate::sim::{
    AutoFire, Engine, EngineSettings, FireworkConfig, LaunchQueue, LaunchSender, Point, Preset, Viewport,
    launch_queue, presets,
};
use crossterm::event::{Event, KeyCode, MouseButton, MouseEventKind};
use log::{debug, info, warn};
use std::io::Write;
use std::sync::{Arc, Mutex, TryLockError};
use std::thread;

/// The logical viewport is scaled to roughly this height so launch speeds
/// tuned in pixels per frame still reach the upper sky.
const REFERENCE_HEIGHT: f64 = 800.0;

pub type SharedDesigner = Arc<Mutex<Box<dyn RecipeSource + Send>>>;

pub struct ShowOptions {
    pub bg_color: Rgb,
    /// Logical pixels per surface pixel; picked from the surface height when unset.
    pub scale: Option<f64>,
    pub settings: EngineSettings,
    pub auto_fire: bool,
    pub designer: Option<Box<dyn RecipeSource + Send>>,
    pub prompt: String,
    pub seed: Option<u64>,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            bg_color: (0, 0, 0),
            scale: None,
            settings: EngineSettings::default(),
            auto_fire: false,
            designer: None,
            prompt: String::new(),
            seed: None,
        }
    }
}

pub struct FireworksEffect {
    width: usize,
    height: usize,
    engine: Engine,
    canvas: Canvas,
    renderer: Renderer,
    auto_fire: AutoFire,
    presets: Vec<Preset>,
    launches: LaunchSender,
    queue: LaunchQueue,
    designer: Option<SharedDesigner>,
    prompt: String,
    rng: fastrand::Rng,
    bg_color: Rgb,
    output_buf: Vec<u8>,
}

impl FireworksEffect {
    pub fn new(width: usize, height: usize, options: ShowOptions) -> Self {
        let scale = options
            .scale
            .unwrap_or_else(|| (REFERENCE_HEIGHT / height.max(1) as f64).max(1.0));
        let mut rng = match options.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let viewport = Viewport::new(width as f64 * scale, height as f64 * scale);
        let engine = Engine::with_rng(options.settings, viewport, rng.fork());
        let (launches, queue) = launch_queue();

        let mut auto_fire = AutoFire::new();
        auto_fire.set_enabled(options.auto_fire, &mut rng);

        info!(
            "show {}x{} px, scale {:.2}, logical {:.0}x{:.0}, cap {} particles",
            width,
            height,
            scale,
            viewport.width,
            viewport.height,
            engine.settings().max_particles
        );

        Self {
            width,
            height,
            engine,
            canvas: Canvas::new(width, height),
            renderer: Renderer::new(scale),
            auto_fire,
            presets: presets(),
            launches,
            queue,
            designer: options.designer.map(|d| Arc::new(Mutex::new(d))),
            prompt: options.prompt,
            rng,
            bg_color: options.bg_color,
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Queue a launch; it takes off on the next simulation step.
    pub fn launch(&self, config: FireworkConfig, target: Option<Point>) {
        self.launches.send(config, target);
    }

    /// A sender for launches from other threads.
    pub fn launcher(&self) -> LaunchSender {
        self.launches.clone()
    }

    pub fn set_auto_fire(&mut self, enabled: bool) {
        self.auto_fire.set_enabled(enabled, &mut self.rng);
    }

    pub fn is_auto_firing(&self) -> bool {
        self.auto_fire.is_enabled()
    }

    /// Map a terminal cell to the logical point at its centre.
    pub fn cell_to_point(&self, column: u16, row: u16) -> Point {
        let scale = self.renderer.scale();
        Point::new((column as f64 + 0.5) * scale, (row as f64 * 2.0 + 1.0) * scale)
    }

    /// Ask the recipe designer for a config in the background. The result
    /// arrives through the launch queue as an ambient launch.
    pub fn request_design(&mut self) -> Option<thread::JoinHandle<()>> {
        let Some(designer) = &self.designer else {
            debug!("no recipe designer configured");
            return None;
        };

        let designer = Arc::clone(designer);
        let launches = self.launches.clone();
        let prompt = self.prompt.clone();
        let mut rng = self.rng.fork();

        Some(thread::spawn(move || {
            let mut source = match designer.try_lock() {
                Ok(source) => source,
                // A designer that panicked earlier is still usable.
                Err(TryLockError::Poisoned(poisoned)) => {
                    warn!("recipe designer panicked on an earlier request");
                    poisoned.into_inner()
                }
                Err(TryLockError::WouldBlock) => {
                    debug!("recipe designer busy, ignoring request");
                    return;
                }
            };
            let config = recipe::design(&mut **source, &prompt, &mut rng);
            if !launches.send(config, None) {
                debug!("show closed before the recipe arrived");
            }
        }))
    }

    fn random_preset(&mut self) -> &Preset {
        let index = self.rng.usize(..self.presets.len());
        &self.presets[index]
    }

    fn launch_preset(&mut self, index: usize) {
        if let Some(preset) = self.presets.get(index) {
            self.launches.send(preset.config.clone(), None);
        }
    }

    fn clean(&mut self) {
        self.engine.clear();
        self.canvas.clear();
    }
}

impl Effect for FireworksEffect {
    fn update(&mut self, dt: f32) {
        if self.auto_fire.advance(dt as f64, &mut self.rng) {
            let mut rng = self.rng.fork();
            let config = self.random_preset().config.varied_for_show(&mut rng);
            self.launches.send(config, None);
        }

        for request in self.queue.drain() {
            self.engine.launch(&request.config, request.target);
        }

        self.engine.step();
        self.renderer.draw(&self.engine, &mut self.canvas);
    }

    fn render<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let bg_color = self.bg_color;
        let mut prev_top_color: Rgb = (255, 255, 255);
        let mut prev_bot_color: Rgb = (255, 255, 255);

        // Render using half-blocks
        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top_color = self.canvas.composite(x, y, bg_color);
                let bot_color = if y + 1 < self.height {
                    self.canvas.composite(x, y + 1, bg_color)
                } else {
                    top_color
                };

                if top_color != prev_top_color {
                    write!(
                        self.output_buf,
                        "\x1b[48;2;{};{};{}m",
                        top_color.0, top_color.1, top_color.2
                    )?;
                    prev_top_color = top_color;
                }
                if bot_color != prev_bot_color {
                    write!(
                        self.output_buf,
                        "\x1b[38;2;{};{};{}m",
                        bot_color.0, bot_color.1, bot_color.2
                    )?;
                    prev_bot_color = bot_color;
                }

                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top_color = (255, 255, 255);
            prev_bot_color = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()?;
        Ok(())
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.canvas.resize(width, height);

        let scale = self.renderer.scale();
        self.engine
            .resize(Viewport::new(width as f64 * scale, height as f64 * scale));
        self.output_buf.reserve((width * height * 25).saturating_sub(self.output_buf.capacity()));
    }

    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Mouse(mouse_event) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse_event.kind {
                    let target = self.cell_to_point(mouse_event.column, mouse_event.row);
                    let mut rng = self.rng.fork();
                    let config = self.random_preset().config.varied_for_click(&mut rng);
                    self.launches.send(config, Some(target));
                }
            }
            Event::Key(key_event) => match key_event.code {
                KeyCode::Char(c @ '1'..='9') => {
                    self.launch_preset(c as usize - '1' as usize);
                }
                KeyCode::Char(' ') | KeyCode::Char('a') => {
                    let enabled = self.auto_fire.toggle(&mut self.rng);
                    info!("auto-fire {}", if enabled { "started" } else { "stopped" });
                }
                KeyCode::Char('c') => self.clean(),
                KeyCode::Char('d') => {
                    self.request_design();
                }
                _ => {}
            },
            _ => {}
        }
    }
}
