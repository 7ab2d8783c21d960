pub mod report;
pub mod shell;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::fs::File;
use tracing::level_filters::LevelFilter;

use crate::{
    log::store::LogStore,
    session::SessionController,
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
};

use shell::{ShellCommand, TerminalUi};

pub const LOG_FILE_ENV: &str = "POMATO_LOGFILE";
pub const DEFAULT_LOG_FILE: &str = "pomato.log";
pub const DEFAULT_POM_MINUTES: u32 = 25;

#[derive(Parser, Debug)]
#[command(name = "pomato", version)]
#[command(about = "Pomodoro-style time tracker with a plain-text log", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(
        long,
        help = "Path to the pom log. Defaults to $POMATO_LOGFILE, then pomato.log"
    )]
    file: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Show recorded time, filtered by a date or a title")]
    Log {
        #[arg(help = "A date like \"2024-01-01\" or \"yesterday\", or an exact title")]
        filter: Vec<String>,
    },
    #[command(about = "Run a fixed-length pom")]
    Pom {
        #[arg(short, long, default_value_t = DEFAULT_POM_MINUTES, help = "Pom length in minutes")]
        minutes: u32,
        title: Vec<String>,
    },
    #[command(about = "Track an open-ended task until interrupted")]
    Track { title: Vec<String> },
    #[command(
        about = "Set the status of the current pom: + achieved, = focused, - distracted, ? never evaluated"
    )]
    Status { marker: String },
    #[command(about = "Set the title of the current pom")]
    Title { text: Vec<String> },
    #[command(about = "Print version information")]
    Version,
}

impl From<Commands> for ShellCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Log { filter } => ShellCommand::Log {
                filter: (!filter.is_empty()).then(|| filter.join(" ")),
            },
            Commands::Pom { minutes, title } => ShellCommand::Pom {
                minutes,
                title: title.join(" "),
            },
            Commands::Track { title } => ShellCommand::Track {
                title: title.join(" "),
            },
            Commands::Status { marker } => ShellCommand::Status { marker },
            Commands::Title { text } => ShellCommand::Title {
                text: text.join(" "),
            },
            Commands::Version => ShellCommand::Version,
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&create_application_default_path()?, logging_level, args.log)?;

    if let Some(Commands::Version) = args.command {
        // No reason to touch (or choke on) the log file for this.
        println!("pomato {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let path = resolve_log_path(args.file);
    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .await?;

    let mut store = LogStore::load(file).await?;
    // Canonicalize hand-edited or legacy-format files up front.
    store.normalize_and_persist().await?;

    let mut controller = SessionController::new(store, Box::new(DefaultClock), TerminalUi);

    match args.command {
        None => shell::run_shell(controller).await,
        Some(command) => {
            shell::execute(&mut controller, command.into()).await?;
            Ok(())
        }
    }
}

/// `--file` wins, then the environment, then `pomato.log` next to the caller.
fn resolve_log_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var(LOG_FILE_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}
