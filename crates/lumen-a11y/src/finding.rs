//! Findings
//!
//! One accessibility observation. Rules build findings with the builder
//! methods below; the auditor normalizes every finding once, right after
//! the rule returns.

use lumen_dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};

/// Report bucket a finding lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// An automatic fix already applied to the document
    Enhancement,
    /// A defect that needs a manual fix
    Suggestion,
    /// A check that passed (audit mode)
    Conformant,
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Severity used when a rule does not pick one
    pub fn default_for(kind: FindingKind) -> Self {
        match kind {
            FindingKind::Suggestion => Severity::Warning,
            FindingKind::Enhancement | FindingKind::Conformant => Severity::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// One accessibility observation
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub message: String,
    /// Remediation text (suggestions only)
    pub fix: Option<String>,
    /// What an automatic change did (enhancements only)
    pub description: Option<String>,
    /// Affected node; may be detached by the time the report is read
    pub element: Option<NodeId>,
    pub kind: FindingKind,
    pub severity: Severity,
    /// External criterion reference, opaque to the engine
    pub rule_ref: Option<String>,
    /// Category label of the producing rule, set by the auditor
    pub source: Option<&'static str>,
}

impl Finding {
    fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fix: None,
            description: None,
            element: None,
            kind,
            severity: Severity::default_for(kind),
            rule_ref: None,
            source: None,
        }
    }

    pub fn enhancement(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Enhancement, message)
    }

    pub fn suggestion(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Suggestion, message)
    }

    pub fn conformant(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Conformant, message)
    }

    pub fn on(mut self, node: NodeId) -> Self {
        self.element = Some(node);
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_rule_ref(mut self, rule_ref: impl Into<String>) -> Self {
        self.rule_ref = Some(rule_ref.into());
        self
    }

    /// Canonical form: strip fields the kind may not carry, drop element
    /// refs that are not attached and tag the source.
    pub fn normalize(mut self, tree: &DomTree, source: &'static str) -> Self {
        if self.kind != FindingKind::Suggestion {
            self.fix = None;
        }
        if self.kind != FindingKind::Enhancement {
            self.description = None;
        }
        if self.message.is_empty() {
            tracing::debug!("Empty finding message from {}", source);
        }
        self.element = self
            .element
            .filter(|&node| tree.is_attached(node) && tree.element(node).is_some());
        self.source = Some(source);
        self
    }
}
