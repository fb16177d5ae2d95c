//! Response sanitizer and validator for raw provider output.
//!
//! Default (`Lenient`) validation checks only that the parsed value has a
//! truthy `level` and an array `weeks`. Level values, week count, numbering
//! and topics are not checked; anomalies are logged, not rejected.
//! `Strict` is an opt-in behavior change that enforces the full schema.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::roadmap::models::{DifficultyLevel, RoadmapDraft, ROADMAP_WEEKS};

const OPENING_FENCE: &str = "```json";
const CLOSING_FENCE: &str = "```";
const INVALID_STRUCTURE: &str = "Invalid JSON structure";

/// The provider answered, but not with a usable roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider did not return valid JSON: {0}")]
pub struct MalformedOutput(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Truthy `level`, array `weeks`. Nothing more.
    #[default]
    Lenient,
    /// Known level, exactly 12 weeks numbered 1..=12, non-empty string topics.
    Strict,
}

impl ValidationMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            ValidationMode::Strict
        } else {
            ValidationMode::Lenient
        }
    }
}

/// The whitespace set of a JS `trim()`: Unicode `White_Space` minus NEL
/// (U+0085), plus the BOM.
fn is_js_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

fn trim_ws(s: &str) -> &str {
    s.trim_matches(is_js_whitespace)
}

/// Strips one leading "```json" (any case) and one trailing "```".
///
/// A bare leading "```" is left in place.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = trim_ws(raw);

    if text
        .get(..OPENING_FENCE.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(OPENING_FENCE))
    {
        text = trim_ws_start(&text[OPENING_FENCE.len()..]);
    }

    if let Some(stripped) = trim_ws_end(text).strip_suffix(CLOSING_FENCE) {
        text = stripped;
    }

    trim_ws(text)
}

fn trim_ws_start(s: &str) -> &str {
    s.trim_start_matches(is_js_whitespace)
}

fn trim_ws_end(s: &str) -> &str {
    s.trim_end_matches(is_js_whitespace)
}

/// JavaScript truthiness over a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Sanitizes, parses and validates raw provider output into a draft.
pub fn parse_roadmap(raw: &str, mode: ValidationMode) -> Result<RoadmapDraft, MalformedOutput> {
    let cleaned = strip_fences(raw);

    let parsed: Value =
        serde_json::from_str(cleaned).map_err(|e| MalformedOutput(e.to_string()))?;

    let draft = check_structure(parsed)?;

    match mode {
        ValidationMode::Lenient => {
            report_anomalies(&draft);
            Ok(draft)
        }
        ValidationMode::Strict => {
            check_schema(&draft)?;
            Ok(draft)
        }
    }
}

fn check_structure(parsed: Value) -> Result<RoadmapDraft, MalformedOutput> {
    let Value::Object(mut object) = parsed else {
        return Err(MalformedOutput(INVALID_STRUCTURE.to_string()));
    };

    let level = object.remove("level").unwrap_or(Value::Null);
    if !is_truthy(&level) {
        return Err(MalformedOutput(INVALID_STRUCTURE.to_string()));
    }

    match object.remove("weeks") {
        Some(Value::Array(weeks)) => Ok(RoadmapDraft { level, weeks }),
        _ => Err(MalformedOutput(INVALID_STRUCTURE.to_string())),
    }
}

fn report_anomalies(draft: &RoadmapDraft) {
    if draft.difficulty().is_none() {
        warn!(level = %draft.level, "Roadmap level is outside beginner|intermediate|advanced");
    }
    if draft.weeks.len() != ROADMAP_WEEKS {
        warn!(
            weeks = draft.weeks.len(),
            expected = ROADMAP_WEEKS,
            "Roadmap week count differs from the requested plan length"
        );
    }
}

fn check_schema(draft: &RoadmapDraft) -> Result<(), MalformedOutput> {
    if draft.difficulty().is_none() {
        return Err(MalformedOutput(format!(
            "level must be one of {}, {}, {}; got {}",
            DifficultyLevel::Beginner,
            DifficultyLevel::Intermediate,
            DifficultyLevel::Advanced,
            draft.level
        )));
    }

    if draft.weeks.len() != ROADMAP_WEEKS {
        return Err(MalformedOutput(format!(
            "expected {ROADMAP_WEEKS} weeks, got {}",
            draft.weeks.len()
        )));
    }

    let plans = draft
        .week_plans()
        .map_err(|e| MalformedOutput(format!("week entry has the wrong shape: {e}")))?;

    for (index, plan) in plans.iter().enumerate() {
        let expected = index as u32 + 1;
        if plan.week != expected {
            return Err(MalformedOutput(format!(
                "week {} is out of order (expected {expected})",
                plan.week
            )));
        }
        if plan.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(MalformedOutput(format!("week {expected} has no topics")));
        }
    }

    Ok(())
}
