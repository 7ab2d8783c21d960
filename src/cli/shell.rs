use std::io::Write as _;

use ansi_term::Colour::{Green, Red};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Local};
use tokio::{select, task};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::AppError,
    log::{score::daily_score, store::LogResource},
    session::{interrupt, SessionController, SessionKind, SessionUi},
    utils::time::format_clock,
};

use super::report::{self, LogFilter};
use super::DEFAULT_POM_MINUTES;

/// One parsed command, shared between the one-shot CLI and the shell loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Log { filter: Option<String> },
    Pom { minutes: u32, title: String },
    Track { title: String },
    Status { marker: String },
    Title { text: String },
    Version,
    Quit,
}

/// The interactive command loop. The prompt carries today's score, the
/// current record's status marker, and the active title.
pub async fn run_shell<F: LogResource>(
    mut controller: SessionController<F, TerminalUi>,
) -> Result<()> {
    loop {
        print!("{}", prompt(&controller));
        let _ = std::io::stdout().flush();

        let line = select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nBye!");
                return Ok(());
            }
            line = read_line() => line,
        };
        let Some(line) = line else {
            // EOF behaves like quit.
            return Ok(());
        };

        match parse_line(&line) {
            None => {}
            Some(Err(unknown)) => println!("Unknown command: {unknown}"),
            Some(Ok(command)) => {
                if execute(&mut controller, command).await? {
                    return Ok(());
                }
            }
        }
    }
}

/// Executes one command. Returns whether the loop should quit.
pub async fn execute<F: LogResource>(
    controller: &mut SessionController<F, TerminalUi>,
    command: ShellCommand,
) -> Result<bool> {
    match command {
        ShellCommand::Quit => return Ok(true),
        ShellCommand::Version => println!("pomato {}", env!("CARGO_PKG_VERSION")),
        ShellCommand::Log { filter } => {
            let filter = filter
                .as_deref()
                .map(report::parse_filter)
                .unwrap_or(LogFilter::All);
            print!(
                "{}",
                report::render_log(controller.store().records(), &filter, controller.now())
            );
        }
        ShellCommand::Pom { minutes, title } => {
            println!("Task - {title}");
            let cancel = CancellationToken::new();
            let watcher = tokio::spawn(interrupt::cancel_on_ctrl_c(cancel.clone()));
            controller
                .run_fixed(&title, Duration::minutes(i64::from(minutes)), &cancel)
                .await?;
            watcher.abort();
        }
        ShellCommand::Track { title } => {
            println!("Task - {title}");
            let cancel = CancellationToken::new();
            let watcher = tokio::spawn(interrupt::cancel_on_ctrl_c(cancel.clone()));
            controller.run_open(&title, &cancel).await?;
            watcher.abort();
        }
        ShellCommand::Status { marker } => {
            report_edit(controller.edit_status(&marker).await)?;
        }
        ShellCommand::Title { text } => {
            report_edit(controller.edit_title(&text).await)?;
        }
    }
    Ok(false)
}

/// Edit failures are reported and the loop goes on; anything touching the
/// file itself still propagates.
fn report_edit(result: Result<(), AppError>) -> Result<()> {
    match result {
        Err(
            error @ (AppError::NoCurrentSession
            | AppError::InvalidStatus(_)
            | AppError::EmptyTitle),
        ) => {
            println!("ERROR: {error}");
            Ok(())
        }
        other => Ok(other?),
    }
}

fn prompt<F: LogResource>(controller: &SessionController<F, TerminalUi>) -> String {
    let now = controller.now();
    let today = now.with_timezone(&Local).date_naive();
    let score = daily_score(controller.store().records(), today, &Local);
    let (marker, active) = match controller.store().current(now) {
        Some(record) => (record.status.marker(), record.title.as_str()),
        None => (' ', "no active pom - pom to get started"),
    };
    format!(
        "pomato ({}/{}):{marker}:{active}> ",
        Green.paint(format!("+{:.1}", score.earned)),
        Red.paint(format!("-{:.1}", score.lost)),
    )
}

fn parse_line(line: &str) -> Option<Result<ShellCommand, String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (verb, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let rest = rest.trim();
    let command = match verb {
        "log" => ShellCommand::Log {
            filter: (!rest.is_empty()).then(|| rest.to_string()),
        },
        "pom" => ShellCommand::Pom {
            minutes: DEFAULT_POM_MINUTES,
            title: rest.to_string(),
        },
        "track" => ShellCommand::Track {
            title: rest.to_string(),
        },
        "status" => ShellCommand::Status {
            marker: rest.to_string(),
        },
        "title" => ShellCommand::Title {
            text: rest.to_string(),
        },
        "version" => ShellCommand::Version,
        "quit" | "q" => ShellCommand::Quit,
        unknown => return Some(Err(unknown.to_string())),
    };
    Some(Ok(command))
}

async fn read_line() -> Option<String> {
    task::spawn_blocking(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    })
    .await
    .ok()
    .flatten()
}

/// Terminal face of a running session: carriage-return ticker, bell on
/// completion, y/n save prompts.
pub struct TerminalUi;

#[async_trait]
impl SessionUi for TerminalUi {
    fn tick(&mut self, elapsed: Duration, remaining: Option<Duration>) {
        print!("\r{}", format_clock(remaining.unwrap_or(elapsed)));
        let _ = std::io::stdout().flush();
    }

    fn completed(&mut self) {
        println!("\nDone!\x07");
    }

    async fn confirm_save(&mut self, kind: SessionKind, elapsed: Duration) -> Option<bool> {
        match kind {
            SessionKind::Fixed => print!("\nAborted - save to log anyway?\ny/[n]: "),
            SessionKind::Open => {
                print!("\n{} time spent, save?\n[y]/n: ", format_clock(elapsed));
            }
        }
        let _ = std::io::stdout().flush();
        parse_decision(&read_line().await.unwrap_or_default())
    }
}

/// Explicit yes, explicit (or garbled) no, or `None` to let the session kind
/// decide.
fn parse_decision(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" => None,
        _ => Some(false),
    }
}
