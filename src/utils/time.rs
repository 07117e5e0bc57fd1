use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Format a timestamp as a `HH:MM:SS` clock label for transcript lines.
pub fn clock_label(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".to_string())
}

/// Format a timestamp as RFC 3339, falling back to the debug rendering.
pub fn rfc3339_label(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| format!("{at:?}"))
}
