//! Recovers a task field mapping from raw model output.
//!
//! Models wrap JSON in prose or code fences more often than not. The parser
//! first tries the whole text, then the first balanced `{...}` span. A
//! mapping is only accepted if it carries at least one task key.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::logging::{preview, PipelineEvent, PipelineObserver, TracingObserver};

/// Keys that identify a JSON object as a task candidate.
pub const TASK_KEYS: [&str; 6] = [
    "title",
    "description",
    "priority",
    "category_id",
    "due_date",
    "assigned_to",
];

const PREVIEW_CHARS: usize = 120;

/// Tolerant parser for model output.
#[derive(Clone)]
pub struct StructuredResponseParser {
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for StructuredResponseParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredResponseParser").finish_non_exhaustive()
    }
}

impl Default for StructuredResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredResponseParser {
    /// Parser reporting to [`TracingObserver`].
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Parser reporting to a custom observer.
    pub fn with_observer(observer: Arc<dyn PipelineObserver>) -> Self {
        Self { observer }
    }

    /// Recover a task mapping from `raw`, or `None` if there is none.
    pub fn parse(&self, raw: &str) -> Option<Map<String, Value>> {
        let found = parse_task_object(raw.trim())
            .or_else(|| first_balanced_object(raw).and_then(parse_task_object));
        if found.is_none() {
            self.observer.on_event(&PipelineEvent::MalformedResponse {
                preview: preview(raw.trim(), PREVIEW_CHARS),
            });
        }
        found
    }
}

/// Parse `text` as a JSON object that looks like a task.
fn parse_task_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) if TASK_KEYS.iter().any(|key| map.contains_key(*key)) => Some(map),
        _ => None,
    }
}

/// The first balanced `{...}` span in `text`.
///
/// Braces inside JSON strings (and escaped quotes) are ignored. Returns
/// `None` if the first opening brace is never closed.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in text.get(start..)?.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth = depth.saturating_add(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start.checked_add(offset)?.checked_add(c.len_utf8())?;
                    return text.get(start..end);
                }
            }
            _ => {}
        }
    }
    None
}
