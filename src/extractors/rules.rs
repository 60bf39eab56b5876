//! Keyword and pattern rules for the rule-based extractor.
//!
//! Each family is an explicit ordered table so every rule can be tested on
//! its own and the evaluation order is visible in one place.

use regex::Regex;

use crate::dates::{month_from_name, weekday_from_name};
use crate::types::{Category, Priority};

/// Maximum title length (in chars) when no sentence boundary is found.
pub const TITLE_MAX_CHARS: usize = 50;

/// Chars of the vehicle identifier used in a synthesised title.
pub const VIN_PREFIX_CHARS: usize = 8;

const NEGATORS: [&str; 5] = ["not", "isn't", "isnt", "no", "never"];

/// Words allowed between a negator and the high marker it cancels.
const INTENSIFIERS: [&str; 8] = [
    "very",
    "so",
    "that",
    "too",
    "really",
    "particularly",
    "especially",
    "terribly",
];

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority marker families, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityRule {
    /// "urgent", "high priority", "important", "asap", ...
    HighMarker,
    /// "low priority", "not urgent", "can wait", ...
    LowMarker,
}

impl PriorityRule {
    /// The table in evaluation order.
    pub const ORDERED: [PriorityRule; 2] = [Self::HighMarker, Self::LowMarker];

    fn pattern(self) -> &'static str {
        match self {
            Self::HighMarker => {
                r"(?i)\b(?:high[\s-]priority|urgent(?:ly)?|important|asap|critical|immediately)\b"
            }
            Self::LowMarker => {
                r"(?i)\b(?:low[\s-]priority|not\s+(?:(?:very|so|that|too|really)\s+)?urgent|can\s+wait|no\s+rush|whenever)\b"
            }
        }
    }

    fn priority(self) -> Priority {
        match self {
            Self::HighMarker => Priority::High,
            Self::LowMarker => Priority::Low,
        }
    }

    /// Whether the match at `start` counts. Negated high markers ("not
    /// urgent", "isn't important", "not very urgent") do not.
    fn accepts(self, text: &str, start: usize) -> bool {
        match self {
            Self::HighMarker => {
                let before = text.get(..start).unwrap_or_default();
                let mut words = before.split_whitespace().rev().map(str::to_ascii_lowercase);
                let last = words.next().unwrap_or_default();
                let second = words.next().unwrap_or_default();
                let negated = NEGATORS.contains(&last.as_str())
                    || (NEGATORS.contains(&second.as_str())
                        && INTENSIFIERS.contains(&last.as_str()));
                !negated
            }
            Self::LowMarker => true,
        }
    }
}

/// Compiled priority marker table.
#[derive(Debug, Clone)]
pub struct PriorityRules {
    table: Vec<(PriorityRule, Regex)>,
}

impl PriorityRules {
    /// Compile every rule in [`PriorityRule::ORDERED`].
    pub fn new() -> Self {
        let table = PriorityRule::ORDERED
            .iter()
            .filter_map(|rule| Regex::new(rule.pattern()).ok().map(|re| (*rule, re)))
            .collect();
        Self { table }
    }

    /// Classify `text`; Medium when no marker is present.
    pub fn classify(&self, text: &str) -> Priority {
        self.matching_rule(text)
            .map(PriorityRule::priority)
            .unwrap_or_default()
    }

    /// The first rule with an accepted match, if any.
    pub fn matching_rule(&self, text: &str) -> Option<PriorityRule> {
        self.table.iter().find_map(|(rule, re)| {
            re.find_iter(text)
                .any(|m| rule.accepts(text, m.start()))
                .then_some(*rule)
        })
    }
}

impl Default for PriorityRules {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Keyword families for category classification, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRule {
    /// damage / assessment.
    Damage,
    /// claims / insurance / processing.
    Claims,
    /// final / inspection / close.
    Inspection,
}

impl CategoryRule {
    /// The table in evaluation order.
    pub const ORDERED: [CategoryRule; 3] = [Self::Damage, Self::Claims, Self::Inspection];

    fn pattern(self) -> &'static str {
        match self {
            Self::Damage => r"(?i)\b(?:damage[sd]?|damaging|assess(?:ment|ments|ing)?)\b",
            Self::Claims => r"(?i)\b(?:claims?|insurance|insurer|processing)\b",
            Self::Inspection => r"(?i)\b(?:final|inspections?|inspect|close|closing|closure)\b",
        }
    }

    /// Category assigned when this family matches.
    pub fn category(self) -> Category {
        match self {
            Self::Damage => Category::DamageAssessment,
            Self::Claims => Category::ClaimsProcessing,
            Self::Inspection => Category::FinalInspection,
        }
    }
}

/// Compiled category keyword table.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    table: Vec<(CategoryRule, Regex)>,
}

impl CategoryRules {
    /// Compile every rule in [`CategoryRule::ORDERED`].
    pub fn new() -> Self {
        let table = CategoryRule::ORDERED
            .iter()
            .filter_map(|rule| Regex::new(rule.pattern()).ok().map(|re| (*rule, re)))
            .collect();
        Self { table }
    }

    /// First matching family wins; Initial Survey otherwise.
    pub fn classify(&self, text: &str) -> Category {
        self.table
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(rule, _)| rule.category())
            .unwrap_or_default()
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Vehicle identifier and assignee
// ---------------------------------------------------------------------------

/// Finds a 17-character vehicle identification number (no I, O or Q).
#[derive(Debug, Clone)]
pub struct VinMatcher {
    pattern: Option<Regex>,
}

impl VinMatcher {
    /// Compile the identifier pattern.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").ok(),
        }
    }

    /// The first identifier in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.as_ref()?.find(text).map(|m| m.as_str())
    }
}

impl Default for VinMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Title used when a prompt names a vehicle the title does not mention.
pub fn vin_title(vin: &str) -> String {
    let prefix: String = vin.chars().take(VIN_PREFIX_CHARS).collect();
    format!("Survey for {prefix}")
}

/// Captures a capitalised name after "assign to", "assigned to" or "for".
///
/// Explicit assignment phrases are tried before "for". Weekday and month
/// names are never taken as people.
#[derive(Debug, Clone)]
pub struct AssigneeMatcher {
    table: Vec<Regex>,
}

impl AssigneeMatcher {
    /// Compile the trigger patterns.
    pub fn new() -> Self {
        let table = [
            r"\b(?i:assign(?:ed)?\s+to)\s+([A-Z][a-z]+)\b",
            r"\b(?i:for)\s+([A-Z][a-z]+)\b",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
        Self { table }
    }

    /// The first plausible assignee name in `text`.
    pub fn find(&self, text: &str) -> Option<String> {
        self.table.iter().find_map(|re| {
            re.captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .find(|name| weekday_from_name(name).is_none() && month_from_name(name).is_none())
                .map(str::to_owned)
        })
    }
}

impl Default for AssigneeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

/// First sentence of `text`, or its first [`TITLE_MAX_CHARS`] chars.
///
/// Returns `None` for blank input.
pub fn title_from(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(end) = trimmed.find(|c: char| matches!(c, '.' | '!' | '?')) {
        let sentence = trimmed.get(..end).unwrap_or_default().trim();
        if !sentence.is_empty() {
            return Some(sentence.to_owned());
        }
    }
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return Some(trimmed.to_owned());
    }
    let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    Some(format!("{}...", head.trim_end()))
}
