use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use now::DateTimeNow;

use crate::{
    log::{
        record::LogRecord,
        score::{daily_score, elapsed_seconds},
    },
    utils::time::{hms, pretty_hms},
};

/// How to narrow down `log` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    All,
    Day(NaiveDate),
    Title(String),
}

/// A filter argument is a date expression if it reads as one ("2024-01-01",
/// "yesterday", "3 days ago"), otherwise an exact title.
pub fn parse_filter(argument: &str) -> LogFilter {
    match parse_date_string(argument, Local::now(), Dialect::Us) {
        Ok(moment) => LogFilter::Day(moment.beginning_of_day().date_naive()),
        Err(_) => LogFilter::Title(argument.to_lowercase()),
    }
}

/// Renders the `log` report: records grouped by local day, each day headed by
/// its date and score, with a grand total at the bottom.
pub fn render_log(records: &[LogRecord], filter: &LogFilter, now: DateTime<Utc>) -> String {
    let mut selected = records
        .iter()
        .filter(|record| match filter {
            LogFilter::All => true,
            LogFilter::Day(day) => local_day(record) == *day,
            LogFilter::Title(title) => record.title.to_lowercase() == *title,
        })
        .collect::<Vec<_>>();
    selected.sort_by_key(|record| record.start);

    let mut output = String::new();
    let mut current_day = None;
    let mut total_seconds = 0.0;
    for record in selected {
        let day = local_day(record);
        if current_day != Some(day) {
            if current_day.is_some() {
                output.push('\n');
            }
            output.push_str(&format!("{day} ({})\n", daily_score(records, day, &Local)));
            current_day = Some(day);
        }
        let elapsed = elapsed_seconds(record, now);
        let (hours, minutes, seconds) = hms(elapsed as i64);
        output.push_str(&format!(
            "\t{:>9} {}\n",
            pretty_hms(hours, minutes, seconds),
            record.title
        ));
        total_seconds += elapsed;
    }

    let (hours, minutes, seconds) = hms(total_seconds as i64);
    output.push_str(&format!("{}\n", "-".repeat(30)));
    output.push_str(&format!(
        "\t{:>9} total pomodoro time\n",
        pretty_hms(hours, minutes, seconds)
    ));
    output
}

fn local_day(record: &LogRecord) -> NaiveDate {
    record.start.with_timezone(&Local).date_naive()
}
