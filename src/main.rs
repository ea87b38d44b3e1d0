//! streamplay - adaptive playback engine
//!
//! # Usage
//!
//! ```bash
//! # Inspect subtitle files
//! streamplay cues movie.en.srt
//! streamplay at movie.en.srt 1:02:03 --delay-ms -500
//!
//! # Interactive preview of the engine
//! streamplay preview movie.en.srt --start 0.25
//! ```

use std::fs::File;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use streamplay::cli::{Cli, Command, ExitCode, Output};
use streamplay::commands;
use streamplay::config::Config;

const DEFAULT_FILTER: &str = "streamplay=info";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Command::Preview(_)));

    run_cli(cli).await.into()
}

/// Logs go to stderr; the preview owns the terminal, so it logs to a file
fn init_logging(to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        let file = dirs::cache_dir()
            .map(|dir| dir.join("streamplay"))
            .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
            .and_then(|dir| File::create(dir.join("preview.log")).ok());
        if let Some(file) = file {
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        return;
    }

    let _ = builder.with_writer(std::io::stderr).try_init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
        },
        None => Config::load(),
    };

    match cli.command {
        Command::Cues(cmd) => commands::cues_cmd(cmd, &output).await,
        Command::At(cmd) => commands::at_cmd(cmd, &output).await,
        Command::Preview(cmd) => commands::preview_cmd(cmd, config, &output).await,
    }
}
