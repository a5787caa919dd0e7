use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::AppError;
use crate::models::time;

/// Where a task stands relative to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Valid,
    Expired,
    Undated,
}

/// `status` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    None,
    Valid,
    Expired,
}

impl StatusFilter {
    /// Unrecognised values leave filtering off.
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "valid" => Some(StatusFilter::Valid),
            "expired" => Some(StatusFilter::Expired),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        self != StatusFilter::None
    }

    pub fn admits(self, status: DueStatus) -> bool {
        match self {
            StatusFilter::None => true,
            StatusFilter::Valid => matches!(status, DueStatus::Valid | DueStatus::Undated),
            StatusFilter::Expired => status == DueStatus::Expired,
        }
    }
}

/// Classifies a `due_date` value. The date counts from midnight, so a task
/// due today is already expired once the day has started.
pub fn classify(due_date: Option<&Value>, now: NaiveDateTime) -> Result<DueStatus, AppError> {
    let raw = match due_date {
        None | Some(Value::Null) => return Ok(DueStatus::Undated),
        Some(Value::String(s)) if s.is_empty() => return Ok(DueStatus::Undated),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(AppError::MalformedDate(format!("due_date is {other}")));
        }
    };

    let due = time::parse_date(raw)?.and_time(chrono::NaiveTime::MIN);
    if due < now {
        Ok(DueStatus::Expired)
    } else {
        Ok(DueStatus::Valid)
    }
}
