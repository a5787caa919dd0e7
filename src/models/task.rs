use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::time;

/// A stored task as the document store sees it.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";
pub const TASK_ID: &str = "task_id";
pub const TASK_NAME: &str = "task_name";
pub const DESCRIPTION: &str = "description";
pub const PRIORITY: &str = "priority";
pub const DUE_DATE: &str = "due_date";
pub const PROPERTIES: &str = "properties";
pub const CREATED: &str = "created";
pub const LAST_MODIFIED: &str = "last-modified";
pub const LAST_MODIFIED_PATH: &str = "properties.last-modified";

const REQUIRED_FIELDS: [&str; 3] = [TASK_NAME, DESCRIPTION, PRIORITY];

/// Fields a client may not set at creation.
const SERVER_FIELDS: [&str; 3] = [ID_FIELD, TASK_ID, PROPERTIES];

/// Body of a create request. Any extra fields are stored as-is.
#[derive(Debug, Clone, Default)]
pub struct NewTaskRequest {
    fields: Document,
}

impl NewTaskRequest {
    pub fn from_document(fields: Document) -> Self {
        Self { fields }
    }

    /// Unparseable or non-object bodies become an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match REQUIRED_FIELDS.iter().find(|f| !self.fields.contains_key(**f)) {
            Some(missing) => Err(AppError::BadRequest(format!("missing required field {missing}"))),
            None => Ok(()),
        }
    }

    pub fn into_document(mut self, task_id: i64, created: NaiveDateTime) -> Document {
        for field in SERVER_FIELDS {
            self.fields.remove(field);
        }

        let mut document = Document::new();
        document.insert(TASK_ID.to_string(), Value::from(task_id));
        document.append(&mut self.fields);
        document
            .entry(DUE_DATE.to_string())
            .or_insert_with(|| Value::String(String::new()));

        let mut properties = Document::new();
        properties.insert(CREATED.to_string(), Value::String(time::format_created(created)));
        properties.insert(LAST_MODIFIED.to_string(), Value::String(String::new()));
        document.insert(PROPERTIES.to_string(), Value::Object(properties));
        document
    }
}

/// Fields a conditional update is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableField {
    DueDate,
    Priority,
}

impl MutableField {
    pub const ALL: [MutableField; 2] = [MutableField::DueDate, MutableField::Priority];

    pub fn as_str(self) -> &'static str {
        match self {
            MutableField::DueDate => DUE_DATE,
            MutableField::Priority => PRIORITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub due_date: Option<Value>,
    pub priority: Option<Value>,
}

impl TaskPatch {
    /// Unknown keys are ignored and `null` counts as absent.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Self::from_document(&fields),
            _ => Self::default(),
        }
    }

    pub fn from_document(fields: &Document) -> Self {
        let pick = |field: MutableField| fields.get(field.as_str()).filter(|v| !v.is_null()).cloned();
        Self {
            due_date: pick(MutableField::DueDate),
            priority: pick(MutableField::Priority),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.due_date.is_none() && self.priority.is_none()
    }

    pub fn get(&self, field: MutableField) -> Option<&Value> {
        match field {
            MutableField::DueDate => self.due_date.as_ref(),
            MutableField::Priority => self.priority.as_ref(),
        }
    }

    /// Present fields, in allow-list order.
    pub fn changes(&self) -> impl Iterator<Item = (MutableField, &Value)> {
        MutableField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }
}
