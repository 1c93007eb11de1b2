use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use lumisky::color::Rgb;
use lumisky::effects::Effect;
use lumisky::effects::fireworks::{FireworksEffect, ShowOptions};
use lumisky::recipe::{CommandDesigner, RecipeFile, RecipeSource};
use lumisky::sim::EngineSettings;

const FIXED_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "lumisky")]
#[command(about = "Interactive fireworks in the terminal", long_about = None)]
#[command(version)]
#[command(after_help = "Keys: 1-4 presets, space/a auto-fire, c clear, d design, click to aim, q/Esc/Ctrl+C quit")]
struct Cli {
    /// Background color as hex (e.g. --bg-color 1a1b26)
    #[arg(long, value_name = "RRGGBB", value_parser = parse_hex_color)]
    bg_color: Option<Rgb>,

    /// Logical pixels per terminal half-cell (default: fit ~800 px of sky)
    #[arg(long)]
    scale: Option<f64>,

    /// Cap on live particles; the oldest are evicted first
    #[arg(long, default_value_t = EngineSettings::default().max_particles)]
    max_particles: usize,

    /// Start with auto-fire running
    #[arg(long)]
    auto_fire: bool,

    /// JSON recipe file used by the design key
    #[arg(long, value_name = "FILE", env = "LUMISKY_RECIPE")]
    recipe: Option<PathBuf>,

    /// External designer command; receives the prompt as its last argument
    #[arg(long, value_name = "CMD", env = "LUMISKY_DESIGNER", conflicts_with = "recipe")]
    designer: Option<String>,

    /// Description handed to the designer
    #[arg(long, default_value = "a golden willow that slowly fades")]
    prompt: String,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_hex_color(hex: &str) -> Result<Rgb, String> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected RRGGBB, got {hex:?}"));
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string());
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    if let Some(path) = &cli.log_file {
        let file = File::create(path).with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn designer(cli: &Cli) -> Result<Option<Box<dyn RecipeSource + Send>>> {
    if let Some(command) = &cli.designer {
        let designer = CommandDesigner::from_command_line(command)?;
        return Ok(Some(Box::new(designer)));
    }
    Ok(cli.recipe.as_ref().map(|path| {
        let file = RecipeFile::new(path);
        info!("recipes from {}", file.path().display());
        Box::new(file) as Box<dyn RecipeSource + Send>
    }))
}

fn run_effect<W: Write>(out: &mut W, options: ShowOptions, design_on_start: bool) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut effect = FireworksEffect::new(cols as usize, rows as usize * 2, options);
    if design_on_start {
        effect.request_design();
    }

    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key_event) => {
                    if key_event.code == KeyCode::Char('q')
                        || key_event.code == KeyCode::Esc
                        || (key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                    {
                        break;
                    }
                    effect.handle_event(&event);
                }
                Event::Resize(cols, rows) => {
                    effect.resize(*cols as usize, *rows as usize * 2);
                    execute!(out, Clear(ClearType::All))?;
                }
                _ => effect.handle_event(&event),
            }
        }

        let now = Instant::now();
        accumulator += now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        accumulator = accumulator.min(FIXED_DT * 3.0);

        while accumulator >= FIXED_DT {
            effect.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        effect.render(out)?;
    }

    let engine = effect.engine();
    info!("show ended after {} rockets in {} frames", engine.launched(), engine.frame());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let designer = designer(&cli)?;
    let design_on_start = designer.is_some();
    let options = ShowOptions {
        bg_color: cli.bg_color.unwrap_or((0, 0, 0)),
        scale: cli.scale.filter(|s| s.is_finite() && *s > 0.0),
        settings: EngineSettings { max_particles: cli.max_particles, ..EngineSettings::default() },
        auto_fire: cli.auto_fire,
        designer,
        prompt: cli.prompt,
        seed: None,
    };

    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout());
    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;

    let result = run_effect(&mut stdout, options, design_on_start);

    execute!(stdout, Show, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal::disable_raw_mode()?;

    if let Err(e) = &result {
        error!("show aborted: {e:#}");
    }
    result
}
