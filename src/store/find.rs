use std::cmp::Ordering;

use serde_json::Value;

use crate::models::Document;
use crate::models::task::{DUE_DATE, ID_FIELD, PRIORITY, TASK_ID};
use crate::store::document::{compare_values, lookup, set_path};

/// Which documents an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    TaskId(i64),
}

impl Filter {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::TaskId(id) => document.get(TASK_ID).and_then(Value::as_i64) == Some(*id),
        }
    }
}

/// Fields a client may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Priority,
    DueDate,
}

impl SortField {
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "priority" => Some(SortField::Priority),
            "due_date" => Some(SortField::DueDate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Priority => PRIORITY,
            SortField::DueDate => DUE_DATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `asc` is ascending; every other value means descending.
    pub fn from_param(raw: &str) -> Self {
        if raw == "asc" {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ordering = compare_values(a.get(self.field.as_str()), b.get(self.field.as_str()));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Subset of fields returned by a find.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    /// Listed paths only; `_id` is dropped unless `include_id` is set.
    Include { fields: Vec<String>, include_id: bool },
}

impl Projection {
    pub fn from_fields<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fields = Vec::new();
        let mut include_id = false;
        for name in names {
            if name == ID_FIELD {
                include_id = true;
            } else if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
        Projection::Include { fields, include_id }
    }

    pub fn includes(&self, field: &str) -> bool {
        match self {
            Projection::All => true,
            Projection::Include { fields, include_id } => {
                (field == ID_FIELD && *include_id) || fields.iter().any(|f| f == field)
            }
        }
    }

    /// Same projection with one more field requested.
    pub fn with_field(&self, field: &str) -> Self {
        match self {
            Projection::All => Projection::All,
            Projection::Include { fields, include_id } if !self.includes(field) => {
                let mut fields = fields.clone();
                fields.push(field.to_string());
                Projection::Include { fields, include_id: *include_id }
            }
            other => other.clone(),
        }
    }

    pub fn apply(&self, document: Document) -> Document {
        let (fields, include_id) = match self {
            Projection::All => return document,
            Projection::Include { fields, include_id } => (fields, *include_id),
        };

        let mut projected = Document::new();
        if include_id {
            if let Some(id) = document.get(ID_FIELD) {
                projected.insert(ID_FIELD.to_string(), id.clone());
            }
        }
        for field in fields {
            if let Some(value) = lookup(&document, field) {
                set_path(&mut projected, field, value.clone());
            }
        }
        projected
    }
}

/// Everything a find needs: filter, projection, sort, then skip and limit.
/// A `limit` of zero returns every remaining document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub filter: Filter,
    pub projection: Projection,
    pub sort: Option<Sort>,
    pub skip: u64,
    pub limit: u64,
}
