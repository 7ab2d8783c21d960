use std::fmt::{self, Display};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::record::LogRecord;

/// Point tally for one day. Both components sum non-negative table values,
/// so neither can go negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyScore {
    pub earned: f64,
    pub lost: f64,
}

impl Display for DailyScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{:.1}/-{:.1}", self.earned, self.lost)
    }
}

/// Sums the (earned, lost) pairs of records whose start falls on `day` when
/// viewed in `tz`. Storage stays UTC; the zone is a render-time choice.
pub fn daily_score<Tz: TimeZone>(records: &[LogRecord], day: NaiveDate, tz: &Tz) -> DailyScore {
    let mut score = DailyScore::default();
    for record in records {
        if record.start.with_timezone(tz).date_naive() == day {
            let (earned, lost) = record.status.points();
            score.earned += earned;
            score.lost += lost;
        }
    }
    score
}

/// Elapsed seconds of a record, counting an open interval up to `now`.
pub fn elapsed_seconds(record: &LogRecord, now: DateTime<Utc>) -> f64 {
    let end = record.end.unwrap_or(now);
    (end - record.start).num_milliseconds() as f64 / 1000.0
}
