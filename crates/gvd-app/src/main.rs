//! GVD console entry point.
//!
//! Reads commands from standard input, one per line. End a line with `?`
//! for context help or with a tab for completion; `quit` leaves.

mod console;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use console::ConsoleTranscript;
use gvd_platform::LinuxPlatform;
use gvd_terminal::{Services, standard_cli};
use gvd_types::config::CliConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Resolve config from CLI arg, GVD_CONFIG env var, or the working directory.
    let config_path: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GVD_CONFIG").ok())
        .unwrap_or_else(|| "gvd.toml".to_string())
        .into();
    let config = CliConfig::resolve(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    log::info!("Starting GVD (config {})", config_path.display());

    let transcript = Arc::new(
        ConsoleTranscript::create(&config.logfile)
            .with_context(|| format!("opening console log {}", config.logfile.display()))?,
    );

    let platform = Arc::new(LinuxPlatform::new());
    let services = Services {
        system: Arc::clone(&platform) as _,
        time: Arc::clone(&platform) as _,
        shell: platform,
        console: Arc::clone(&transcript) as _,
    };

    let banner = config.banner;
    let cli = standard_cli(config, &services)?;
    log::info!(
        "CLI ready on host {} (console log {})",
        cli.hostname(),
        transcript.path().display()
    );

    let stdin = std::io::stdin();
    repl::run(&cli, &transcript, banner, stdin.lock(), std::io::stdout())?;

    log::info!("GVD shut down");
    Ok(())
}
