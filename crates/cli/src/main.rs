// climazone CLI - climate-zone resolution for Italian municipalities

mod exit_codes;
mod resolve;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "climazone")]
#[command(about = "Assign a climate zone to every Italian municipality")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every registry municipality and write cities JSON
    #[command(after_help = "\
Examples:
  climazone run run.toml
  climazone run run.toml --json
  climazone run run.toml --output cities.json --strict")]
    Run {
        /// Path to the run config (.toml)
        config: std::path::PathBuf,

        /// Print the full run result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write cities JSON here instead of the config's [output] file
        #[arg(long)]
        output: Option<std::path::PathBuf>,

        /// Exit 6 when any assignment is in the low-confidence list
        #[arg(long)]
        strict: bool,
    },

    /// Validate a run config without running
    #[command(after_help = "\
Examples:
  climazone validate run.toml")]
    Validate {
        /// Path to the run config (.toml)
        config: std::path::PathBuf,
    },

    /// Print the normalized form of each name
    #[command(after_help = "\
Examples:
  climazone normalize \"Sant'Angelo d'Alife\" \"Poiana Maggiore\"")]
    Normalize {
        /// Names to normalize
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output, strict } => resolve::cmd_run(config, json, output, strict),
        Commands::Validate { config } => resolve::cmd_validate(config),
        Commands::Normalize { names } => cmd_normalize(&names),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// normalize
// ============================================================================

fn cmd_normalize(names: &[String]) -> Result<(), CliError> {
    use std::io::Write;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for name in names {
        writeln!(handle, "{}", climazone_resolver::normalize(name))
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
