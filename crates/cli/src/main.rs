mod commands;
mod exit_code;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

pub use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "lintrc")]
#[command(about = "Inspect layered linter and formatter configs", long_about = None)]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Path to the config file (searched upwards from the current directory by default)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Fail when a record meets a non-record value while merging
    #[arg(long, global = true)]
    strict: bool,

    /// Force colored output even when not a TTY
    #[arg(long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long, global = true, conflicts_with = "color")]
    no_color: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub strict: bool,
    /// Whether to show informational output (success messages, summaries)
    pub show_info: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved config for a file
    Print {
        /// File to resolve the config for
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Show which layers produced the config for a file
    Explain {
        /// File to resolve the config for
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Check that the config loads, its patterns compile and its presets exist
    Validate {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Path used to probe resolution
        #[arg(long, value_name = "PATH", default_value = commands::validate::DEFAULT_PROBE)]
        probe: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON output for tooling
    Json,
    /// YAML output
    Yaml,
}

fn main() {
    let cli = Cli::parse();

    init_tracing();
    configure_colors(cli.color, cli.no_color);

    let options = GlobalOptions {
        config_path: cli.config,
        strict: cli.strict,
        show_info: !cli.quiet,
    };

    let result = match cli.command {
        Commands::Print { file, format } => commands::print::run(&options, &file, format),
        Commands::Explain { file, format } => commands::explain::run(&options, &file, format),
        Commands::Validate { format, probe } => commands::validate::run(&options, &probe, format),
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "✗".red().bold());
        ExitCode::for_error(&err).exit();
    }
    ExitCode::Success.exit();
}

/// Initialize tracing, filtered by `RUST_LOG` and written to stderr
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Apply the color choice to the `colored` crate. `None` leaves it to TTY
/// detection.
fn configure_colors(force_color: bool, no_color: bool) {
    if let Some(enabled) = color_choice(force_color, no_color, |name| std::env::var(name).ok()) {
        colored::control::set_override(enabled);
    }
}

/// Decide whether output is colored from the flags and the `NO_COLOR`,
/// `CLICOLOR_FORCE` and `CLICOLOR` conventions
/// (<https://no-color.org/>, <https://bixense.com/clicolors/>).
///
/// Flags win over the environment. `CLICOLOR_FORCE`, when set at all,
/// shadows `CLICOLOR`.
fn color_choice(
    force_color: bool,
    no_color: bool,
    env: impl Fn(&str) -> Option<String>,
) -> Option<bool> {
    if force_color {
        return Some(true);
    }
    if no_color || env("NO_COLOR").is_some() {
        return Some(false);
    }
    match (env("CLICOLOR_FORCE"), env("CLICOLOR")) {
        (Some(forced), _) => (!forced.is_empty() && forced != "0").then_some(true),
        (None, Some(clicolor)) if clicolor == "0" => Some(false),
        _ => None,
    }
}
