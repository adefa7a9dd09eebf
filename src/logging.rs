//! Logger setup.
//!
//! The game owns the terminal in alternate-screen mode, so log lines go to a
//! file when one is given. Without a file nothing is printed unless
//! `RUST_LOG` asks for it.

use env_logger::{Builder, Env, Target};
use log::{error, LevelFilter};
use std::fs::File;
use std::io;
use std::panic;
use std::path::Path;

/// Initializes the global logger.
///
/// When `verbose` is `true`, debug messages are written. Otherwise only info
/// level and above are shown.
pub fn init(verbose: bool, log_file: Option<&Path>) -> io::Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            let env = Env::default().default_filter_or(level.to_string());
            let mut builder = Builder::from_env(env);
            builder.target(Target::Pipe(Box::new(file)));
            builder
        }
        None => Builder::from_env(Env::default().default_filter_or("off")),
    };

    // `try_init` only fails if a logger was already set. Ignore that case so
    // tests can call `init` multiple times without panicking.
    let _ = builder.try_init();
    Ok(())
}

/// Send panic reports to `sink` instead of stderr.
pub fn route_panics<F>(sink: F)
where
    F: Fn(String) + Send + Sync + 'static,
{
    panic::set_hook(Box::new(move |info| sink(info.to_string())));
}

/// Panic reports go to the log while the game owns the terminal, so a
/// caught subscriber panic does not scribble over the alternate screen.
pub fn log_panics() {
    route_panics(|report| error!("{report}"));
}

/// Back to the default stderr panic report.
pub fn restore_panic_output() {
    let _ = panic::take_hook();
}
