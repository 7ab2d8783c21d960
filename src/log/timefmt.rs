use chrono::{DateTime, FixedOffset, Utc};

/// Width of one encoded timestamp. The blank placeholder for an absent end
/// timestamp must be exactly this wide so the columns stay aligned.
pub const TIMESTAMP_WIDTH: usize = 29;

const CANONICAL: &str = "%Y-%m-%d %H:%M:%S%.f%z";

/// Older logs were written without fractional seconds, or without seconds at
/// all and with a colon in the offset. These stay parseable forever; the next
/// rewrite canonicalizes them.
const LEGACY: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M%z"];

/// Encodes a timestamp as `YYYY-MM-DD HH:MM:SS.ffff±HHMM`. chrono has no
/// 4-digit fraction specifier, so the fraction is assembled by hand.
pub fn encode(moment: DateTime<Utc>) -> String {
    format!(
        "{}.{:04}{}",
        moment.format("%Y-%m-%d %H:%M:%S"),
        moment.timestamp_subsec_micros() / 100,
        moment.format("%z"),
    )
}

/// Decodes one timestamp field, preserving the offset it was written with.
pub fn decode(field: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let field = field.trim();
    let mut result = DateTime::parse_from_str(field, CANONICAL);
    for pattern in LEGACY {
        if result.is_ok() {
            break;
        }
        result = DateTime::parse_from_str(field, pattern);
    }
    result
}

/// A blank field is "no value", not an error.
pub fn decode_opt(field: &str) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
    if field.trim().is_empty() {
        Ok(None)
    } else {
        decode(field).map(Some)
    }
}
