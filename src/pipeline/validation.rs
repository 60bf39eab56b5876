//! Field-level validation of a candidate mapping.
//!
//! Every input ends in a fully valid [`ExtractedTask`]: missing or unusable
//! fields get fixed defaults and each substitution is reported.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::dates::{week_after, DateResolver};
use crate::logging::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::types::{Category, ExtractedTask, Priority, DEFAULT_TEXT};

/// Assignee values that mean "nobody".
const EMPTY_ASSIGNEES: [&str; 7] = [
    "none",
    "null",
    "n/a",
    "na",
    "unassigned",
    "nobody",
    "not specified",
];

/// Outcome of reading one field from the candidate.
enum Field<T> {
    Valid(T),
    Missing,
    Invalid(String),
}

/// Enforces the required-field contract.
#[derive(Clone)]
pub struct FieldValidator {
    resolver: DateResolver,
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldValidator").finish_non_exhaustive()
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidator {
    /// Validator reporting to [`TracingObserver`].
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Validator reporting to a custom observer.
    pub fn with_observer(observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            resolver: DateResolver::new(),
            observer,
        }
    }

    /// Build a task from `candidate`, defaulting anything missing or invalid.
    pub fn validate(&self, candidate: &Map<String, Value>, reference: NaiveDate) -> ExtractedTask {
        let title = self.settle("title", text_field(candidate, "title"), || {
            DEFAULT_TEXT.to_owned()
        });
        let description = self.settle("description", text_field(candidate, "description"), || {
            DEFAULT_TEXT.to_owned()
        });
        let priority = self.settle("priority", priority_field(candidate), Priority::default);
        let category_id = self.settle("category_id", category_field(candidate), Category::default);
        let due_date = self.due_date(candidate, reference);
        let assigned_to = assignee_field(candidate);

        ExtractedTask {
            title,
            description,
            priority,
            category_id,
            due_date,
            assigned_to,
        }
    }

    fn settle<T>(&self, field: &'static str, value: Field<T>, default: impl FnOnce() -> T) -> T {
        match value {
            Field::Valid(v) => v,
            Field::Missing => {
                self.observer.on_event(&PipelineEvent::FieldDefaulted { field });
                default()
            }
            Field::Invalid(value) => {
                self.observer
                    .on_event(&PipelineEvent::FieldInvalid { field, value });
                default()
            }
        }
    }

    fn due_date(&self, candidate: &Map<String, Value>, reference: NaiveDate) -> NaiveDate {
        let raw = match text_field(candidate, "due_date") {
            Field::Valid(raw) => raw,
            Field::Missing => {
                self.observer
                    .on_event(&PipelineEvent::FieldDefaulted { field: "due_date" });
                return week_after(reference);
            }
            Field::Invalid(value) => {
                self.observer.on_event(&PipelineEvent::FieldInvalid {
                    field: "due_date",
                    value,
                });
                return week_after(reference);
            }
        };
        if raw.trim().eq_ignore_ascii_case("in a week") {
            return week_after(reference);
        }
        match self.resolver.resolve(&raw, reference) {
            Some(date) => date,
            None => {
                self.observer
                    .on_event(&PipelineEvent::DateUnresolved { phrase: raw });
                week_after(reference)
            }
        }
    }
}

fn text_field(candidate: &Map<String, Value>, key: &str) -> Field<String> {
    match candidate.get(key) {
        None | Some(Value::Null) => Field::Missing,
        Some(Value::String(s)) if !s.trim().is_empty() => Field::Valid(s.trim().to_owned()),
        Some(Value::String(_)) => Field::Missing,
        Some(other) => Field::Invalid(other.to_string()),
    }
}

fn priority_field(candidate: &Map<String, Value>) -> Field<Priority> {
    match text_field(candidate, "priority") {
        Field::Valid(raw) => match Priority::parse(&raw) {
            Some(priority) => Field::Valid(priority),
            None => Field::Invalid(raw),
        },
        Field::Missing => Field::Missing,
        Field::Invalid(raw) => Field::Invalid(raw),
    }
}

fn category_field(candidate: &Map<String, Value>) -> Field<Category> {
    let id = match candidate.get("category_id") {
        None | Some(Value::Null) => return Field::Missing,
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match id.and_then(Category::from_id) {
        Some(category) => Field::Valid(category),
        None => Field::Invalid(candidate.get("category_id").map(Value::to_string).unwrap_or_default()),
    }
}

fn assignee_field(candidate: &Map<String, Value>) -> Option<String> {
    match text_field(candidate, "assigned_to") {
        Field::Valid(name) if !EMPTY_ASSIGNEES.contains(&name.to_ascii_lowercase().as_str()) => {
            Some(name)
        }
        _ => None,
    }
}
