//! Wire formats for task timestamps.
//!
//! Values are compared as `chrono` types; strings only exist at the edges.

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde_json::Value;

use crate::error::AppError;
use crate::models::task::{Document, LAST_MODIFIED, PROPERTIES};

/// `properties.last-modified`, `ETag` and `Last-Modified`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// `due_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// `properties.created`.
pub const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Local wall-clock time truncated to whole seconds, so the value written to
/// the store and the one sent back in headers compare equal.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
}

pub fn format_created(at: NaiveDateTime) -> String {
    at.format(CREATED_FORMAT).to_string()
}

/// Stored modification instant of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LastModified {
    Never,
    At(NaiveDateTime),
}

impl LastModified {
    /// Reads `properties.last-modified`. Missing, `null` and `""` all mean
    /// the task was never modified; anything else must parse.
    pub fn from_document(document: &Document) -> Result<Self, AppError> {
        let raw = document
            .get(PROPERTIES)
            .and_then(|p| p.get(LAST_MODIFIED));

        match raw {
            None | Some(Value::Null) => Ok(LastModified::Never),
            Some(Value::String(s)) if s.is_empty() => Ok(LastModified::Never),
            Some(Value::String(s)) => Ok(LastModified::At(parse_timestamp(s)?)),
            Some(other) => Err(AppError::MalformedDate(format!("last-modified is {other}"))),
        }
    }
}
