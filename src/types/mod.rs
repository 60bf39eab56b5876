//! Core types shared by both extraction paths.
//!
//! [`ExtractedTask`] is the only thing that leaves the pipeline. The model
//! path and the fallback path both build it, and nothing in its shape tells
//! the two apart.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default value for text fields the pipeline could not fill.
pub const DEFAULT_TEXT: &str = "Not specified";

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal work. The default for anything unrecognised.
    #[default]
    Medium,
    /// Urgent.
    High,
}

impl Priority {
    /// Parse one of `Low`, `Medium`, `High` (case-insensitive).
    ///
    /// Returns `None` for anything else, including partial words.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Canonical display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work category. Serialised as its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Category {
    /// Id 1, also the fallback for anything unrecognised.
    #[default]
    InitialSurvey,
    /// Id 2.
    DamageAssessment,
    /// Id 3.
    ClaimsProcessing,
    /// Id 4.
    FinalInspection,
}

impl Category {
    /// Every category in id order.
    pub const ALL: [Category; 4] = [
        Self::InitialSurvey,
        Self::DamageAssessment,
        Self::ClaimsProcessing,
        Self::FinalInspection,
    ];

    /// Look up a category by id. Only 1 through 4 are valid.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::InitialSurvey),
            2 => Some(Self::DamageAssessment),
            3 => Some(Self::ClaimsProcessing),
            4 => Some(Self::FinalInspection),
            _ => None,
        }
    }

    /// Numeric id used on the wire.
    pub fn id(self) -> u8 {
        match self {
            Self::InitialSurvey => 1,
            Self::DamageAssessment => 2,
            Self::ClaimsProcessing => 3,
            Self::FinalInspection => 4,
        }
    }

    /// Human-readable name, as shown to the model in the instruction template.
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialSurvey => "Initial Survey",
            Self::DamageAssessment => "Damage Assessment",
            Self::ClaimsProcessing => "Claims Processing",
            Self::FinalInspection => "Final Inspection",
        }
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

impl TryFrom<u8> for Category {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(i64::from(id)).ok_or_else(|| format!("unknown category id {id}"))
    }
}

/// A structured task record produced from a free-form prompt.
///
/// Every instance handed to a caller has all five required fields set and
/// individually valid. `due_date` is always absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTask {
    /// Short, non-empty title.
    pub title: String,
    /// Longer description; the prompt itself when nothing better exists.
    pub description: String,
    /// Priority level.
    pub priority: Priority,
    /// Work category, serialised as `category_id`.
    pub category_id: Category,
    /// Absolute due date, serialised as `YYYY-MM-DD`.
    pub due_date: NaiveDate,
    /// Display name of the assignee, if one was mentioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}
