// podium CLI - refresh competition standings from the command line

mod cycle;
mod exit_codes;
mod fetch;
mod sinks;
mod sources;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use podium_standings::BoardConfig;

use exit_codes::{rank_error_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "podium")]
#[command(about = "Reconcile competition leaderboards against a team roster and rank by category")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one refresh cycle and publish the standings
    #[command(after_help = "\
Examples:
  podium run board.toml
  podium run board.toml --json
  podium run board.toml --output standings.json --backup history.csv
  podium run board.toml --scores-dir snapshots/
  podium run board.toml --watch 15 --output standings.json
  KAGGLE_USERNAME=me KAGGLE_KEY=... podium run board.toml

Exit codes: 0 updated, 3 waiting for data / partial, 4 technical failure")]
    Run {
        /// Path to the board config (.toml)
        config: PathBuf,

        /// Read leaderboards from <DIR>/<competition>.csv instead of Kaggle
        #[arg(long)]
        scores_dir: Option<PathBuf>,

        /// Print the JSON snapshot to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON snapshot to a file (overwritten each cycle)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Append each cycle's standings to a CSV history file
        #[arg(long)]
        backup: Option<PathBuf>,

        /// Re-run every SECS seconds until interrupted; leaderboard
        /// downloads are reused for cache_ttl_secs
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,

        /// Kaggle username (default: KAGGLE_USERNAME env, then kaggle.json)
        #[arg(long)]
        username: Option<String>,

        /// Kaggle API key (default: KAGGLE_KEY env, then kaggle.json)
        #[arg(long)]
        key: Option<String>,
    },

    /// Validate a board config and its roster without fetching
    #[command(after_help = "\
Examples:
  podium validate board.toml")]
    Validate {
        /// Path to the board config (.toml)
        config: PathBuf,
    },

    /// Download every competition's leaderboard to <OUT_DIR>/<competition>.csv
    #[command(after_help = "\
Examples:
  podium fetch board.toml --out-dir snapshots/
  podium run board.toml --scores-dir snapshots/")]
    Fetch {
        /// Path to the board config (.toml)
        config: PathBuf,

        /// Directory for the downloaded CSV files
        #[arg(long)]
        out_dir: PathBuf,

        /// Kaggle username (default: KAGGLE_USERNAME env, then kaggle.json)
        #[arg(long)]
        username: Option<String>,

        /// Kaggle API key (default: KAGGLE_KEY env, then kaggle.json)
        #[arg(long)]
        key: Option<String>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            config,
            scores_dir,
            json,
            output,
            backup,
            watch,
            username,
            key,
        } => cycle::cmd_run(cycle::RunArgs {
            config,
            scores_dir,
            json,
            output,
            backup,
            watch,
            username,
            key,
        }),
        Commands::Validate { config } => cycle::cmd_validate(config),
        Commands::Fetch {
            config,
            out_dir,
            username,
            key,
        } => fetch::cmd_fetch(config, out_dir, username, key),
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

/// Read and validate a board config. Returns the config and the directory
/// relative paths inside it resolve against.
pub(crate) fn load_board(config_path: &Path) -> Result<(BoardConfig, PathBuf), CliError> {
    let text = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::args(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    let config = BoardConfig::from_toml(&text).map_err(CliError::rank)?;
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Map an engine error to its registry exit code.
    pub fn rank(err: podium_standings::RankError) -> Self {
        Self { code: rank_error_exit_code(&err), message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
