//! Rule-based task extractor, the deterministic fallback path.
//!
//! Produces the same [`ExtractedTask`] shape as the model path using only
//! pattern tables. It never fails, never reads the clock and gives
//! byte-identical output for identical `(prompt, reference)` pairs.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::dates::{format_iso, week_after};
use crate::logging::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::types::{ExtractedTask, DEFAULT_TEXT};

pub mod due_date;
pub mod rules;

use due_date::{DueDateRules, DueMatch};
use rules::{title_from, vin_title, AssigneeMatcher, CategoryRules, PriorityRules, VinMatcher};

/// Deterministic pattern-matching extractor.
#[derive(Clone)]
pub struct RuleBasedExtractor {
    priority: PriorityRules,
    category: CategoryRules,
    vin: VinMatcher,
    assignee: AssigneeMatcher,
    due: DueDateRules,
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for RuleBasedExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBasedExtractor").finish_non_exhaustive()
    }
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedExtractor {
    /// Extractor reporting to [`TracingObserver`].
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Extractor reporting to a custom observer.
    pub fn with_observer(observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            priority: PriorityRules::new(),
            category: CategoryRules::new(),
            vin: VinMatcher::new(),
            assignee: AssigneeMatcher::new(),
            due: DueDateRules::new(),
            observer,
        }
    }

    /// Extract a task from `prompt`, resolving dates against `reference`.
    pub fn extract(&self, prompt: &str, reference: NaiveDate) -> ExtractedTask {
        let text = prompt.trim();

        let mut title = title_from(text).unwrap_or_else(|| {
            self.observer
                .on_event(&PipelineEvent::FieldDefaulted { field: "title" });
            DEFAULT_TEXT.to_owned()
        });
        let mut description = if text.is_empty() {
            self.observer
                .on_event(&PipelineEvent::FieldDefaulted { field: "description" });
            DEFAULT_TEXT.to_owned()
        } else {
            text.to_owned()
        };

        if let Some(vin) = self.vin.find(text) {
            description = format!("VIN: {vin}\n{description}");
            if !title.to_ascii_uppercase().contains(vin) {
                title = vin_title(vin);
            }
        }

        let due_date = match self.due.find(text, reference) {
            DueMatch::Resolved(_, date) => date,
            DueMatch::Invalid(pattern) => {
                self.observer.on_event(&PipelineEvent::DateUnresolved {
                    phrase: format!("{pattern:?}"),
                });
                week_after(reference)
            }
            DueMatch::NoMatch => {
                self.observer
                    .on_event(&PipelineEvent::FieldDefaulted { field: "due_date" });
                week_after(reference)
            }
        };

        let task = ExtractedTask {
            title,
            description,
            priority: self.priority.classify(text),
            category_id: self.category.classify(text),
            due_date,
            assigned_to: self.assignee.find(text),
        };

        tracing::debug!(
            title = %task.title,
            priority = %task.priority,
            category_id = task.category_id.id(),
            due_date = %format_iso(task.due_date),
            "rule-based extraction complete"
        );

        task
    }
}
