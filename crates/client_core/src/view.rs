//! Display projection of board messages: list keys, row titles, localized
//! timestamps and the stacked/side-by-side layout decision.

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use shared::domain::Message;
use tracing::warn;

pub const INVALID_DATE: &str = "Invalid date";
pub const EMPTY_BODY_PLACEHOLDER: &str = "No message";
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Narrower screens stack the form above the list. The board's web layout
/// switches at 768 px; at 8 px per terminal cell that is 96 columns.
pub const WIDE_LAYOUT_MIN_COLUMNS: u16 = 96;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub key: String,
    pub title: String,
    pub timestamp: String,
}

impl MessageRow {
    pub fn project(index: usize, message: &Message) -> Self {
        Self::project_in(index, message, &Local)
    }

    pub fn project_in<Tz>(index: usize, message: &Message, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let body = message
            .mensagem
            .as_deref()
            .unwrap_or(EMPTY_BODY_PLACEHOLDER);
        Self {
            key: message.list_key(index),
            title: format!("{}: {body}", message.nome),
            timestamp: format_timestamp_in(message.data.as_deref(), tz),
        }
    }
}

pub fn project_rows(messages: &[Message]) -> Vec<MessageRow> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| MessageRow::project(index, message))
        .collect()
}

/// Parses an ISO-8601 timestamp. Values without an offset are read as wall
/// time in `tz`; a bare date is midnight UTC.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(tz));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(tz))
}

pub fn format_timestamp(raw: Option<&str>) -> String {
    format_timestamp_in(raw, &Local)
}

pub fn format_timestamp_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match raw.and_then(|raw| parse_timestamp(raw, tz)) {
        Some(parsed) => parsed.format(TIMESTAMP_FORMAT).to_string(),
        None => {
            warn!(raw = raw.unwrap_or_default(), "invalid message timestamp");
            INVALID_DATE.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Stacked,
    SideBySide,
}

impl Layout {
    pub fn for_width(columns: u16) -> Self {
        if columns < WIDE_LAYOUT_MIN_COLUMNS {
            Layout::Stacked
        } else {
            Layout::SideBySide
        }
    }
}
