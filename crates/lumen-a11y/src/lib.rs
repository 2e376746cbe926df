//! Lumen Accessibility
//!
//! Audits a [`Document`](lumen_dom::Document) for accessibility defects and,
//! in enhance mode, repairs the ones that have a safe automatic fix.
//!
//! The [`Auditor`] runs an ordered set of [`Rule`]s over the document, tags
//! and buckets their [`Finding`]s, scores the result and keeps the last
//! [`Report`]. A [`ChangeWatcher`] re-runs the pass silently when the host
//! delivers a batch of DOM mutations.

mod finding;
mod config;
mod score;
mod report;
mod watcher;
mod auditor;
mod collaborators;
pub mod rules;

pub use finding::{Finding, FindingKind, Severity};
pub use config::{AuditConfig, Mode, RuleToggles};
pub use score::{Grade, ScoreDetails, grade_explanation, score};
pub use report::{Report, RuleFailure, SerializableFinding, SerializableReport, selector_for};
pub use watcher::{ChangeWatcher, WatchState};
pub use auditor::{Auditor, AuditorBuilder, AuditorHandle, ReportCallback};
pub use collaborators::{
    ReportExporter, ReportRenderer, ScriptLoader, SpeechController, SpeechState,
};
pub use rules::{Rule, RuleKind};

use lumen_dom::{DomError, SelectorError};
use thiserror::Error;

/// Engine-level errors
#[derive(Debug, Error)]
pub enum A11yError {
    /// Configuration JSON could not be read
    #[error("Invalid configuration: {0}")]
    Config(#[source] serde_json::Error),
    /// Report could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A rule failed during a pass
    #[error("Rule '{rule}' failed: {message}")]
    RuleFailure { rule: String, message: String },
}

/// Errors raised inside a single rule
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

pub type RuleResult<T> = Result<T, RuleError>;

/// Character budget for element text shown in messages
pub const DISPLAY_BUDGET: usize = 30;

/// Character budget for field and heading names
pub const NAME_BUDGET: usize = 25;

/// Collapse whitespace and cut to `max` characters, marking the cut with `…`
pub fn truncate_for_display(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(max).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("  Learn\n   more ", DISPLAY_BUDGET), "Learn more");
        let long = "a".repeat(31);
        let cut = truncate_for_display(&long, DISPLAY_BUDGET);
        assert_eq!(cut.chars().count(), 31);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate_for_display(&"é".repeat(30), DISPLAY_BUDGET), "é".repeat(30));
    }

    #[test]
    fn test_rule_error_wraps_dom_error() {
        let err: RuleError = DomError::ReadOnly.into();
        assert_eq!(err.to_string(), "Document is read-only");
    }
}
