//! sio CLI - talk to a Socket.IO server from the terminal.
//!
//! Useful for poking at a server during development: print the events it
//! pushes, or fire events at it from scripts.

mod commands;

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::error;

use sio_core::config::AppConfig;
use sio_core::error::SioResult;
use sio_core::logging;

/// sio - Socket.IO client for the command line.
#[derive(Parser)]
#[command(name = "sio", version, about = "Socket.IO client CLI")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to the configured log directory.
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and print server events until interrupted.
    Listen {
        /// Server URL (overrides config).
        #[arg(short, long)]
        url: Option<String>,
        /// Extra request header as NAME:VALUE (repeatable).
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Event name to print (repeatable).
        #[arg(short, long = "event")]
        events: Vec<String>,
    },
    /// Connect, send an event and disconnect.
    Emit {
        /// Event name.
        event: String,
        /// Event arguments; JSON values, anything else is sent as a string.
        args: Vec<String>,
        /// Server URL (overrides config).
        #[arg(short, long)]
        url: Option<String>,
        /// Extra request header as NAME:VALUE (repeatable).
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// How many times to send the event.
        #[arg(long, default_value = "1")]
        repeat: u32,
        /// Pause between repeats in milliseconds.
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        /// Seconds to wait for the connection.
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> SioResult<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(Path::new(path))?,
        None => AppConfig::load_default()?,
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let _log_guard = if cli.log_file {
        let dir = config.effective_log_dir()?;
        Some(logging::init_logging(level, &dir, config.logging.json_output)?)
    } else {
        logging::init_console_logging(level);
        None
    };

    match cli.command {
        Commands::Listen {
            url,
            headers,
            events,
        } => commands::listen::run(&config, url, headers, events).await,
        Commands::Emit {
            event,
            args,
            url,
            headers,
            repeat,
            interval_ms,
            timeout,
        } => {
            let options = commands::emit::EmitOptions {
                repeat,
                interval_ms,
                timeout_secs: timeout,
            };
            commands::emit::run(&config, url, headers, &event, args, options).await
        }
    }
}
