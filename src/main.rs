use std::io::{self, Stdout, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEventKind,
    },
    execute, terminal,
};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use dino_shout::arcade::ArcadeWorld;
use dino_shout::audio::{EnergySource, Microphone};
use dino_shout::render::{Hud, Renderer, Scene};
use dino_shout::sfx::Sfx;
use dino_shout::{GameLoop, Tuning, logging};

/// Shout to run, whistle to jump.
#[derive(Parser, Debug)]
#[command(name = "dino-shout", version, about)]
struct Args {
    /// TOML file overriding the built-in tuning
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames per second; one physics step per frame
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(10..=240))]
    fps: u32,

    /// Disable sound effects
    #[arg(long)]
    mute: bool,

    /// Where to write logs [default: dino-shout.log in the temp dir]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("dino-shout.log"));
    let _log_guard = logging::init(&log_file, args.log_level)?;

    let tuning = match &args.config {
        Some(path) => Tuning::load(Some(path.as_path()))
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Tuning::default(),
    };
    info!(fps = args.fps, mute = args.mute, "starting");

    let mut mic = Microphone::new(tuning.audio.clone());
    mic.open();

    let sfx = if args.mute {
        None
    } else {
        match Sfx::new() {
            Ok(sfx) => Some(sfx),
            Err(err) => {
                warn!(%err, "no sound output, playing muted");
                None
            }
        }
    };

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore(&mut stdout());
        default_hook(info);
    }));

    let mut out = stdout();
    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    let result = execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )
    .context("Failed to set up the terminal")
    .and_then(|()| run(&mut out, &args, &tuning, &mut mic, sfx.as_ref()));

    restore(&mut out).context("Failed to restore the terminal")?;
    info!("bye");
    result
}

fn restore(out: &mut Stdout) -> io::Result<()> {
    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

fn run(
    out: &mut Stdout,
    args: &Args,
    tuning: &Tuning,
    mic: &mut Microphone,
    sfx: Option<&Sfx>,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut game = GameLoop::new(tuning, &mut rng);
    let mut world = ArcadeWorld::new(&tuning.world);

    let (cols, rows) = terminal::size()?;
    let mut renderer = Renderer::new(cols, rows);

    let frame_dur = Duration::from_secs_f64(1.0 / args.fps as f64);
    let dt = 1.0 / args.fps as f32;
    let mapper = game.mapper().clone();
    let jump_threshold = mapper.jump_energy_threshold();
    let mut score = 0;

    loop {
        let frame_start = Instant::now();

        // Input
        let mut retry = false;
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => retry = true,
                    _ => {}
                },
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    retry |= renderer.retry_hit(mouse.column, mouse.row);
                }
                Event::Resize(c, r) => renderer.resize(c, r),
                _ => {}
            }
        }
        if retry && game.restart(&mut rng) {
            world.reset();
            score = 0;
        }

        // Update
        mic.refresh();
        let frame = world.frame_context();
        let (runner, hits) = world.parts();
        let report = game.step(&frame, &*mic, runner, hits, &mut rng);
        if let Some(sfx) = sfx {
            if report.jumped() {
                sfx.play_jump();
            }
            if report.game_over {
                sfx.play_death();
            }
        }
        if let Some(s) = report.score {
            score = s;
        }
        world.integrate(dt, game.context().scroller.entities());

        // Render
        let scene = Scene {
            world: &world,
            entities: game.context().scroller.entities(),
            hud: Hud {
                score,
                run_energy: mic.energy(mapper.run_band),
                jump_energy: mic.energy(mapper.jump_band),
                jump_threshold,
                run_band: mapper.run_band,
                jump_band: mapper.jump_band,
                mic: mic.status(),
                game_over: game.state().is_over(),
            },
        };
        renderer.draw(&scene);
        renderer.present(out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}
