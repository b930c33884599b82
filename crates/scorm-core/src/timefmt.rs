//! `HH:MM:SS` session/total time strings used by the runtime data model.

pub const ZERO_TIME: &str = "00:00:00";

/// Format whole seconds as `HH:MM:SS`. Hours are not capped at 99.
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parse an `HH:MM:SS` string back to seconds.
///
/// Empty input and `00:00:00` are zero. Missing or non-numeric components
/// count as zero rather than failing, since these values come from course
/// content.
pub fn parse_time(time: &str) -> u64 {
    let time = time.trim();
    if time.is_empty() || time == ZERO_TIME {
        return 0;
    }
    let mut parts = time.split(':').map(|p| p.trim().parse::<u64>().unwrap_or(0));
    let hours = parts.next().unwrap_or(0);
    let minutes = parts.next().unwrap_or(0);
    let secs = parts.next().unwrap_or(0);
    hours * 3600 + minutes * 60 + secs
}
