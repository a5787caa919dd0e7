//! Turns the raw query string of a task read into a [`QueryConfig`].
//!
//! Parsing fails closed: one unknown key or bad value rejects the whole
//! request before any document is queried.

use crate::error::AppError;
use crate::services::status::StatusFilter;
use crate::store::{Filter, Projection, Sort, SortDirection, SortField};

/// Trailing path segment meaning "every task".
pub const COLLECTION_MARKER: &str = "tasks";

/// What a read addresses, resolved from the last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    All,
    Task(i64),
}

impl ReadTarget {
    pub fn from_segment(segment: &str) -> Result<Self, AppError> {
        if segment == COLLECTION_MARKER {
            return Ok(ReadTarget::All);
        }
        segment
            .parse::<i64>()
            .map(ReadTarget::Task)
            .map_err(|_| AppError::BadRequest(format!("invalid task id {segment:?}")))
    }

    pub fn filter(self) -> Filter {
        match self {
            ReadTarget::All => Filter::All,
            ReadTarget::Task(id) => Filter::TaskId(id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryConfig {
    pub sort_field: Option<SortField>,
    pub sort_direction: Option<SortDirection>,
    pub projection: Projection,
    /// Zero means no limit.
    pub limit: u64,
    pub offset: u64,
    pub status: StatusFilter,
}

impl QueryConfig {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let mut config = QueryConfig::default();
        let Some(raw) = raw else {
            return Ok(config);
        };

        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let decoded = decode(pair);
            let mut parts = decoded.split('=');
            let (key, value) = match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => (key, value),
                _ => return Err(AppError::BadRequest(format!("malformed parameter {pair:?}"))),
            };
            config.apply(key, value)?;
        }

        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        match key {
            "sort" => {
                let field = SortField::from_param(value)
                    .ok_or_else(|| AppError::BadRequest(format!("cannot sort by {value:?}")))?;
                self.sort_field = Some(field);
            }
            "order" => self.sort_direction = Some(SortDirection::from_param(value)),
            "fields" => {
                let names: Vec<&str> = value.split(',').filter(|f| !f.is_empty()).collect();
                if names.is_empty() {
                    return Err(AppError::BadRequest("empty field list".to_string()));
                }
                self.projection = Projection::from_fields(names);
            }
            "limit" => self.limit = parse_count(key, value)?,
            "offset" => self.offset = parse_count(key, value)?,
            "status" => {
                if let Some(status) = StatusFilter::from_param(value) {
                    self.status = status;
                }
            }
            _ => return Err(AppError::BadRequest(format!("unsupported parameter {key:?}"))),
        }
        Ok(())
    }

    /// Sorting only applies once both the field and the order were given.
    pub fn sort(&self) -> Option<Sort> {
        match (self.sort_field, self.sort_direction) {
            (Some(field), Some(direction)) => Some(Sort { field, direction }),
            _ => None,
        }
    }
}

/// Only quotes and spaces are decoded; every other escape passes through.
fn decode(pair: &str) -> String {
    pair.replace("%22", "").replace("%20", " ")
}

/// Counts must fit in a signed 64-bit integer so every store reads them alike.
fn parse_count(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| AppError::BadRequest(format!("{key} must be a non-negative integer, got {value:?}")))
}
