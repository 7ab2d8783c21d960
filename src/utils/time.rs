use chrono::Duration;

/// Breaks a number of seconds into whole hours, minutes, and seconds.
pub fn hms(seconds: i64) -> (i64, i64, i64) {
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    (hours, minutes, seconds)
}

/// Formats h/m/s as a fixed 9-character column, blanking zero components so
/// the units line up across report rows. All-zero renders as `       0s`.
pub fn pretty_hms(hours: i64, minutes: i64, seconds: i64) -> String {
    let hrs = if hours != 0 { format!("{hours:>2}h") } else { "   ".to_string() };
    let mins = if minutes != 0 { format!("{minutes:>2}m") } else { "   ".to_string() };
    let secs = if seconds != 0 { format!("{seconds:>2}s") } else { "   ".to_string() };
    let elapsed = format!("{hrs}{mins}{secs}");
    if elapsed.trim().is_empty() {
        "       0s".to_string()
    } else {
        elapsed
    }
}

/// `H:MM:SS` ticker for the countdown and elapsed displays.
pub fn format_clock(duration: Duration) -> String {
    let (hours, minutes, seconds) = hms(duration.num_seconds().max(0));
    format!("{hours}:{minutes:02}:{seconds:02}")
}
