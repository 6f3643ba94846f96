//! Moment-style date formatting and relative times

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Format used by `{{date}}` when no `format` is given.
pub const DEFAULT_FORMAT: &str = "MMM Do, YYYY";

// Longest first so that `MMMM` wins over `MM` and `Do` over `D`.
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "DDDD", "dddd", "gggg", "GGGG", "MMM", "DDD", "ddd", "SSS", "YY", "MM", "Do",
    "DD", "gg", "ww", "GG", "WW", "HH", "hh", "mm", "ss", "SS", "ZZ", "Q", "M", "D", "X", "w", "e",
    "W", "E", "H", "h", "a", "A", "m", "s", "S", "Z",
];

/// Formats `date` with moment.js tokens. Text inside `[...]` is copied as is;
/// anything that is not a token passes through unchanged.
pub fn format_date(format: &str, date: &DateTime<Utc>) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;
    while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            match rest[1..].find(']') {
                Some(end) => {
                    out.push_str(&rest[1..1 + end]);
                    rest = &rest[end + 2..];
                }
                None => {
                    out.push_str(&rest[1..]);
                    rest = "";
                }
            }
            continue;
        }
        match TOKENS.iter().find(|token| rest.starts_with(**token)) {
            Some(token) => {
                out.push_str(&render_token(token, date));
                rest = &rest[token.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}

fn render_token(token: &str, date: &DateTime<Utc>) -> String {
    let hour12 = match date.hour() % 12 {
        0 => 12,
        hour => hour,
    };
    match token {
        "YYYY" | "gggg" | "GGGG" => date.year().to_string(),
        "YY" | "gg" | "GG" => format!("{:02}", date.year().rem_euclid(100)),
        "Q" => ((date.month0() / 3) + 1).to_string(),
        "MMMM" => date.format("%B").to_string(),
        "MMM" => date.format("%b").to_string(),
        "MM" => format!("{:02}", date.month()),
        "M" => date.month().to_string(),
        "DDDD" => format!("{:03}", date.ordinal()),
        "DDD" => date.ordinal().to_string(),
        "Do" => ordinal(date.day()),
        "DD" => format!("{:02}", date.day()),
        "D" => date.day().to_string(),
        "dddd" => date.format("%A").to_string(),
        "ddd" => date.format("%a").to_string(),
        "e" => date.weekday().num_days_from_sunday().to_string(),
        "E" => date.weekday().number_from_monday().to_string(),
        "ww" | "WW" => format!("{:02}", date.iso_week().week()),
        "w" | "W" => date.iso_week().week().to_string(),
        "X" => date.timestamp().to_string(),
        "HH" => format!("{:02}", date.hour()),
        "H" => date.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "a" => (if date.hour() < 12 { "am" } else { "pm" }).to_string(),
        "A" => (if date.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "mm" => format!("{:02}", date.minute()),
        "m" => date.minute().to_string(),
        "ss" => format!("{:02}", date.second()),
        "s" => date.second().to_string(),
        "SSS" => format!("{:03}", date.timestamp_subsec_millis()),
        "SS" => format!("{:02}", date.timestamp_subsec_millis() / 10),
        "S" => (date.timestamp_subsec_millis() / 100).to_string(),
        // Dates are always UTC.
        "ZZ" => "+0000".to_string(),
        "Z" => "+00:00".to_string(),
        other => other.to_string(),
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Human readable distance from `date` to `now`, e.g. "3 days ago".
pub fn time_ago(date: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(*date);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();
    if minutes < 1 {
        "a few seconds ago".to_string()
    } else if minutes < 2 {
        "a minute ago".to_string()
    } else if minutes < 60 {
        format!("{minutes} minutes ago")
    } else if hours < 2 {
        "an hour ago".to_string()
    } else if hours < 24 {
        format!("{hours} hours ago")
    } else if hours < 48 {
        "a day ago".to_string()
    } else if days < 25 {
        format!("{days} days ago")
    } else if days < 45 {
        "a month ago".to_string()
    } else if days < 345 {
        format!("{} months ago", (days / 30).max(2))
    } else if days < 548 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", (days / 365).max(2))
    }
}
