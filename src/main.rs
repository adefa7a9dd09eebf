use clap::Parser;
use crossterm::cursor::Show;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use flapstream::build_info;
use flapstream::config::GameConfig;
use flapstream::errors::FlapResult;
use flapstream::game::GameState;
use flapstream::logging;
use flapstream::pipeline::build_pipeline;
use flapstream::stream::sources::EventHost;
use flapstream::ui::Renderer;
use log::{debug, error, info};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::cell::{Cell, RefCell};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

/// Flap through an endless skyline in your terminal
#[derive(Parser)]
#[command(author, version = build_info::VERSION_LINE, about, long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Milliseconds between physics ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Longest the loop blocks waiting for input when no timer is due.
const POLL_CAP: Duration = Duration::from_millis(100);

fn load_config(args: &Args) -> FlapResult<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(ms) = args.tick_ms {
        config.tick_interval_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

/// Terminal modes switched on at startup, to be undone on exit.
#[derive(Debug, Clone, Copy, Default)]
struct TerminalModes {
    mouse: bool,
    /// Key events carry press/repeat/release tags, so a held key flaps once.
    event_types: bool,
}

fn setup_terminal(
    mouse: bool,
    modes: &mut TerminalModes,
) -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    if mouse {
        stdout.execute(EnableMouseCapture)?;
        modes.mouse = true;
    }
    if supports_keyboard_enhancement().unwrap_or(false) {
        stdout.execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
        modes.event_types = true;
    } else {
        debug!("terminal does not report key event types; held keys repeat");
    }
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(modes: TerminalModes) {
    let mut stdout = io::stdout();
    if modes.event_types {
        let _ = stdout.execute(PopKeyboardEnhancementFlags);
    }
    if modes.mouse {
        let _ = stdout.execute(DisableMouseCapture);
    }
    let _ = stdout.execute(LeaveAlternateScreen);
    let _ = stdout.execute(Show);
    let _ = disable_raw_mode();
}

fn play(config: &GameConfig, terminal: Terminal<CrosstermBackend<Stdout>>) -> FlapResult<u32> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("level seed {seed}");

    let initial = GameState::new(seed);
    let host = EventHost::system().with_mouse_capture(config.mouse);
    let pipeline = build_pipeline(&host, config, initial.clone())?;

    let renderer = Rc::new(RefCell::new(Renderer::new(terminal)));
    {
        let renderer = Rc::clone(&renderer);
        let _ = pipeline
            .frames
            .subscribe(move |state: &GameState| renderer.borrow_mut().render(state));
    }

    let best = Rc::new(Cell::new(0u32));
    {
        let best = Rc::clone(&best);
        let _ = pipeline
            .states
            .subscribe(move |state: &GameState| best.set(best.get().max(state.score)));
    }

    let quit = Rc::new(Cell::new(false));
    {
        let quit = Rc::clone(&quit);
        let _ = pipeline.quit.subscribe(move |_| quit.set(true));
    }

    // First frame before any input arrives.
    renderer.borrow_mut().render(&initial);

    while !quit.get() {
        host.poll(POLL_CAP)?;
    }

    info!(
        "quit after {} frames, best score {}",
        renderer.borrow().frames_drawn(),
        best.get()
    );
    Ok(best.get())
}

fn run(args: Args) -> FlapResult<u32> {
    logging::init(args.verbose, args.log_file.as_deref())?;
    info!("flapstream {}", build_info::VERSION_LINE);

    let config = load_config(&args)?;
    let mut modes = TerminalModes::default();
    let terminal = match setup_terminal(config.mouse, &mut modes) {
        Ok(terminal) => terminal,
        Err(err) => {
            restore_terminal(modes);
            return Err(err.into());
        }
    };

    logging::log_panics();
    let result = play(&config, terminal);
    logging::restore_panic_output();
    restore_terminal(modes);
    result
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(best) => {
            println!("Best score: {best}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            eprintln!("flapstream: {err}");
            ExitCode::FAILURE
        }
    }
}
