//! Duration formatting shared by the CLI and the analytics export.

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse `HH:MM:SS` or `MM:SS`. Anything else yields 0.
pub fn parse_hms(text: &str) -> u64 {
    let parts: Option<Vec<u64>> = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect();
    match parts.as_deref() {
        Some([h, m, s]) => h.saturating_mul(3600).saturating_add(m.saturating_mul(60)).saturating_add(*s),
        Some([m, s]) => m.saturating_mul(60).saturating_add(*s),
        _ => 0,
    }
}

/// Clock face `MM:SS` (minutes not wrapped).
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Human readable `"2 hr 5 min"` / `"5 min"`.
pub fn format_duration(total_secs: u64) -> String {
    let minutes = total_secs / 60;
    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;
    if hours > 0 {
        format!("{hours} hr {remaining_minutes} min")
    } else {
        format!("{remaining_minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formats_and_parses() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(100 * 3600), "100:00:00");
        assert_eq!(parse_hms("02:15:00"), 8100);
        assert_eq!(parse_hms("15:30"), 930);
        assert_eq!(parse_hms("garbage"), 0);
        assert_eq!(parse_hms("1:2:3:4"), 0);
        assert_eq!(parse_hms(&format_hms(98765)), 98765);
    }

    #[test]
    fn clock_and_human_formats() {
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3600), "60:00");
        assert_eq!(format_duration(59), "0 min");
        assert_eq!(format_duration(300), "5 min");
        assert_eq!(format_duration(7500), "2 hr 5 min");
    }
}
