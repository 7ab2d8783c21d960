use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::LazyLock,
};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::errors::{AppError, AppResult};

use super::timefmt::{self, TIMESTAMP_WIDTH};

/// Post-hoc self-evaluation of a pom, in the pomodorouboros style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Achieved,
    Focused,
    Distracted,
    NeverEvaluated,
}

impl Status {
    /// The single-character column this status is written as.
    pub fn marker(self) -> char {
        match self {
            Status::Achieved => '+',
            Status::Focused => '=',
            Status::Distracted => '-',
            Status::NeverEvaluated => '?',
        }
    }

    /// (points earned, points lost) towards the daily score.
    pub fn points(self) -> (f64, f64) {
        match self {
            Status::Achieved => (1.25, 0.0),
            Status::Focused => (1.0, 0.0),
            Status::Distracted => (0.25, 1.0),
            Status::NeverEvaluated => (0.1, 1.0),
        }
    }

    /// Absent and unrecognized markers both read as "never evaluated".
    fn from_marker(marker: Option<&str>) -> Status {
        match marker {
            Some("+") => Status::Achieved,
            Some("=") => Status::Focused,
            Some("-") => Status::Distracted,
            _ => Status::NeverEvaluated,
        }
    }
}

impl FromStr for Status {
    type Err = AppError;

    /// Strict parse for the `status` edit command. Unlike [Status::from_marker]
    /// this rejects anything outside the symbol table.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Status::Achieved),
            "=" => Ok(Status::Focused),
            "-" => Ok(Status::Distracted),
            "?" => Ok(Status::NeverEvaluated),
            other => Err(AppError::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// Loose enough for every historical timestamp shape; the decoder decides
/// what actually parses.
const TIMESTAMP_PATTERN: &str =
    r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}(?::\d{2})?(?:\.\d+)?[+-]\d{2}:?\d{2}";

/// One anchored pattern for every line variant: the status column is
/// optional (historical logs had none), the end timestamp may be a blank run
/// (interval still open), and the title takes the remainder of the line.
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<status>[^\s\d])?\s*(?P<start>{ts}) (?P<end>{ts}|[ ]*)(?P<title>.*)$",
        ts = TIMESTAMP_PATTERN
    ))
    .expect("log line pattern compiles")
});

/// One tracked interval. An absent `end` means the interval is still open.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub title: String,
    pub status: Status,
}

impl LogRecord {
    /// Parses one log line. Timestamps are normalized to UTC here; whatever
    /// offset the line was written with only survives as the same instant.
    pub fn parse(line: &str) -> AppResult<LogRecord> {
        let parse_error = || AppError::LogParse {
            line: line.to_string(),
        };
        let captures = LINE_PATTERN.captures(line).ok_or_else(parse_error)?;

        let start = timefmt::decode(&captures["start"]).map_err(|_| parse_error())?;
        let end = timefmt::decode_opt(&captures["end"]).map_err(|_| parse_error())?;

        Ok(LogRecord {
            start: start.with_timezone(&Utc),
            end: end.map(|end| end.with_timezone(&Utc)),
            title: captures["title"].trim().to_string(),
            status: Status::from_marker(captures.name("status").map(|m| m.as_str())),
        })
    }
}

impl Display for LogRecord {
    /// The canonical line encoding. An open interval renders its end as a run
    /// of spaces exactly as wide as a formatted timestamp.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = match self.end {
            Some(end) => timefmt::encode(end),
            None => " ".repeat(TIMESTAMP_WIDTH),
        };
        write!(
            f,
            "{} {} {} {}",
            self.status.marker(),
            timefmt::encode(self.start),
            end,
            self.title
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::{errors::AppError, log::timefmt::TIMESTAMP_WIDTH};

    use super::{LogRecord, Status};

    fn pom() -> LogRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
        LogRecord {
            start,
            end: Some(start + Duration::minutes(25)),
            title: "write spec".to_string(),
            status: Status::Achieved,
        }
    }

    #[test]
    fn round_trips_through_the_codec() {
        let record = pom();
        assert_eq!(LogRecord::parse(&record.to_string()).unwrap(), record);
    }

    #[test]
    fn parses_a_full_line() {
        let record = LogRecord::parse(
            "+ 2024-01-01 09:00:00.0000-0600 2024-01-01 09:25:00.0000-0600 write spec",
        )
        .unwrap();
        assert_eq!(record.status, Status::Achieved);
        assert_eq!(record.title, "write spec");
        assert_eq!(
            record.start,
            Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap()
        );
        assert_eq!(
            record.end,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 15, 25, 0).unwrap())
        );
    }

    #[test]
    fn line_without_marker_is_never_evaluated() {
        let record = LogRecord::parse(
            "2024-01-01 09:00:00.0000-0600 2024-01-01 09:25:00.0000-0600 write spec",
        )
        .unwrap();
        assert_eq!(record.status, Status::NeverEvaluated);
        assert_eq!(record.title, "write spec");
    }

    #[test]
    fn unrecognized_marker_is_never_evaluated() {
        let record = LogRecord::parse(
            "x 2024-01-01 09:00:00.0000-0600 2024-01-01 09:25:00.0000-0600 write spec",
        )
        .unwrap();
        assert_eq!(record.status, Status::NeverEvaluated);
        assert!(record.to_string().starts_with("? "));
    }

    #[test]
    fn open_interval_renders_a_blank_end_of_timestamp_width() {
        let record = LogRecord {
            end: None,
            ..pom()
        };
        let line = record.to_string();
        assert!(line.contains(&" ".repeat(TIMESTAMP_WIDTH)));
        assert_eq!(line.len(), 2 + TIMESTAMP_WIDTH + 1 + TIMESTAMP_WIDTH + 1 + "write spec".len());

        let reparsed = LogRecord::parse(&line).unwrap();
        assert_eq!(reparsed.end, None);
        assert_eq!(reparsed, record);
    }

    #[test]
    fn title_is_trimmed() {
        let record = LogRecord::parse(
            "= 2024-01-01 09:00:00.0000+0000 2024-01-01 09:25:00.0000+0000    padded title  ",
        )
        .unwrap();
        assert_eq!(record.title, "padded title");
    }

    #[test]
    fn title_that_looks_like_a_timestamp_stays_a_title() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
        let record = LogRecord {
            start,
            end: None,
            title: "2024-01-01 09:00:00.0000-0600 retro".to_string(),
            status: Status::NeverEvaluated,
        };
        let reparsed = LogRecord::parse(&record.to_string()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn legacy_minute_precision_lines_parse() {
        let record =
            LogRecord::parse("2018-01-04 16:16-06:00 2018-01-04 16:41-06:00 old entry").unwrap();
        assert_eq!(
            record.start,
            Utc.with_ymd_and_hms(2018, 1, 4, 22, 16, 0).unwrap()
        );
        assert_eq!(record.title, "old entry");
    }

    #[test]
    fn unparsable_line_reports_its_content() {
        let error = LogRecord::parse("definitely not a log line").unwrap_err();
        match error {
            AppError::LogParse { line } => assert_eq!(line, "definitely not a log line"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_timestamp_fails_the_line() {
        // Matches the line shape but the end month is out of range.
        assert!(LogRecord::parse(
            "+ 2024-01-01 09:00:00.0000+0000 2024-13-01 09:25:00.0000+0000 bad month",
        )
        .is_err());
    }
}
