mod cmd;
mod gestures;
mod locate;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "doorlock",
    about = "Gesture-sequence door unlock: match finger counts, drive the actuator",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./doorlock.yaml, else built-in defaults)
    #[arg(long, global = true, env = "DOORLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default doorlock.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the host: gesture tokens on stdin, commands to the actuator
    Host {
        /// Log commands instead of opening the serial port
        #[arg(long)]
        dry_run: bool,

        /// Treat input as raw per-frame counts and stabilize them first
        #[arg(long)]
        raw: bool,

        /// Pause between input tokens, in milliseconds
        #[arg(long, default_value = "0")]
        interval_ms: u64,
    },

    /// Send one command to the actuator and print its reply
    Send {
        /// on or off
        command: String,

        /// How long to collect device output after sending
        #[arg(long, default_value = "500")]
        listen_ms: u64,
    },

    /// Run a simulated actuator on stdin/stdout
    Device {
        /// Poll interval in microseconds
        #[arg(long, default_value = "200")]
        tick_us: u64,
    },

    /// Replay gesture tokens through the matcher and print each event
    Match {
        /// Target sequence override, e.g. 0,1,0,5
        #[arg(long, value_delimiter = ',')]
        target: Option<Vec<u8>>,

        /// Gesture tokens: a finger count, or none / - / x
        #[arg(required = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Host { .. } | Commands::Device { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init { force } => cmd::init::run(config_path, force),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
        Commands::Host {
            dry_run,
            raw,
            interval_ms,
        } => cmd::host::run(config_path, dry_run, raw, interval_ms, cli.json),
        Commands::Send { command, listen_ms } => {
            cmd::send::run(config_path, &command, listen_ms, cli.json)
        }
        Commands::Device { tick_us } => cmd::device::run(config_path, tick_us),
        Commands::Match { target, tokens } => {
            cmd::sequence::run(config_path, target, &tokens, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
