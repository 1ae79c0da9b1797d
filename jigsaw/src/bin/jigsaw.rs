use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use engine::app::{
    AppConfig, AppContext, FrameControl, GameApp, InputEvent, InputFrame, PointerButton, run_game,
};
use engine::graphics::Renderer2d;
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::VirtualKeyCode;

use jigsaw::slicer::prepare_source;
use jigsaw::{
    Board, ConfigStore, GridSize, MaskSet, PlacementMode, PuzzleConfig, PuzzleInput,
    PuzzleSession, SessionEvent,
};

const WINDOW_WIDTH: u32 = 1500;
const WINDOW_HEIGHT: u32 = 1000;

// Stencil size used when no mask directory is given.
const PROCEDURAL_BASE: u32 = 200;
const PROCEDURAL_OVERHANG: u32 = 48;

#[derive(Debug, Parser)]
#[command(name = "jigsaw")]
#[command(about = "Cut an image into an interlocking jigsaw puzzle and solve it")]
struct Cli {
    /// Image to make the puzzle out of.
    #[arg(short, long)]
    image: PathBuf,
    /// Puzzle size in pieces; both must be odd.
    #[arg(short, long, num_args = 2, value_names = ["COLS", "ROWS"], default_values_t = [3, 3])]
    size: Vec<u32>,
    /// Downscale the image so its largest side is at most this many pixels.
    #[arg(short, long)]
    downscale: Option<u32>,
    /// Directory with mask.png, corner.png, odd_edge.png, even_edge.png and middle.png.
    #[arg(long)]
    masks: Option<PathBuf>,
    /// Start with every piece in place.
    #[arg(long, default_value_t = false)]
    presolved: bool,
    /// Seed for the scattered layout.
    #[arg(long)]
    seed: Option<u64>,
    /// Config file; defaults to $JIGSAW_CONFIG_PATH or the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

struct JigsawApp {
    board: Board,
    config: PuzzleConfig,
}

impl GameApp for JigsawApp {
    type State = PuzzleSession;

    fn init_state(&mut self, ctx: &mut AppContext) -> Self::State {
        PuzzleSession::new(self.board.clone(), ctx.surface_size, &self.config)
    }

    fn update_state(
        &mut self,
        session: &mut Self::State,
        input: &InputFrame,
        _dt: Duration,
        _ctx: &mut AppContext,
    ) -> FrameControl {
        for event in &input.events {
            let mapped = match *event {
                InputEvent::KeyPressed(VirtualKeyCode::Escape) => return FrameControl::Exit,
                InputEvent::KeyPressed(VirtualKeyCode::Space) => Some(PuzzleInput::ResetView),
                InputEvent::KeyPressed(_) => None,
                InputEvent::ButtonPressed {
                    button: PointerButton::Primary,
                    x,
                    y,
                } => Some(PuzzleInput::Press {
                    x: x as f32,
                    y: y as f32,
                }),
                InputEvent::ButtonReleased {
                    button: PointerButton::Primary,
                    ..
                } => Some(PuzzleInput::Release),
                InputEvent::ButtonPressed {
                    button: PointerButton::Secondary,
                    ..
                } => Some(PuzzleInput::PanStart),
                InputEvent::ButtonReleased {
                    button: PointerButton::Secondary,
                    ..
                } => Some(PuzzleInput::PanEnd),
                InputEvent::ButtonPressed { .. } | InputEvent::ButtonReleased { .. } => None,
                InputEvent::CursorMoved { dx, dy, .. } => Some(PuzzleInput::Drag {
                    dx: dx as f32,
                    dy: dy as f32,
                }),
                InputEvent::Wheel { lines } => Some(PuzzleInput::Zoom { steps: lines }),
                InputEvent::Resized(size) => Some(PuzzleInput::Resize {
                    width: size.width,
                    height: size.height,
                }),
            };
            let Some(mapped) = mapped else {
                continue;
            };
            for outcome in session.handle_input(mapped) {
                if outcome == SessionEvent::Completed {
                    tracing::info!("all pieces joined, press Escape to quit");
                }
            }
        }
        FrameControl::Continue
    }

    fn render(&mut self, session: &Self::State, renderer: &mut dyn Renderer2d) {
        session.render(renderer);
    }
}

fn load_config(cli: &Cli) -> Result<PuzzleConfig> {
    let store = match &cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::from_env(),
    };
    let mut config = store
        .load()
        .with_context(|| format!("failed to read config {}", store.path().display()))?
        .with_env_overrides();

    if cli.downscale.is_some() {
        config.downscale = cli.downscale;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.presolved {
        config.placement = PlacementMode::PreSolved;
    }
    Ok(config.sanitized())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let (cols, rows) = match cli.size.as_slice() {
        [cols, rows] => (*cols, *rows),
        _ => return Err(anyhow!("--size takes exactly two values")),
    };
    let grid = GridSize::new(cols, rows)?;

    let image = image::open(&cli.image)
        .with_context(|| format!("failed to open image {}", cli.image.display()))?;
    let source = prepare_source(image, config.downscale);

    let masks = match &cli.masks {
        Some(dir) => MaskSet::load_dir(dir)
            .with_context(|| format!("failed to load masks from {}", dir.display()))?,
        None => MaskSet::procedural(PROCEDURAL_BASE, PROCEDURAL_OVERHANG)?,
    };

    tracing::info!(cols, rows, image = %cli.image.display(), "building puzzle");
    let board = Board::build(&source, &masks, grid, &config).context("failed to build puzzle")?;

    let app_config = AppConfig {
        title: format!("Jigsaw {cols}x{rows}"),
        desired_size: PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT),
        clamp_to_monitor: true,
        vsync: None,
    };
    run_game(app_config, JigsawApp { board, config }).map_err(|err| anyhow!("{err}"))
}
