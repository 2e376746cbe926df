//! Reports
//!
//! A [`Report`] is the immutable result of one pass. It keeps live
//! [`NodeId`]s for highlighting; [`SerializableReport`] swaps them for
//! structural selectors so the report can leave the process as JSON.

use crate::score::{Grade, ScoreDetails, score};
use crate::{A11yError, Finding, FindingKind, Mode, Severity};
use chrono::{DateTime, Utc};
use lumen_dom::{DomTree, NodeId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A rule that failed during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub source: String,
    pub message: String,
}

/// Result of one auditor pass
#[derive(Debug, Clone)]
pub struct Report {
    pub enhancements: Vec<Finding>,
    pub suggestions: Vec<Finding>,
    pub conformant: Vec<Finding>,
    pub score: u8,
    pub grade: Grade,
    pub score_details: ScoreDetails,
    pub mode: Mode,
    pub timestamp: DateTime<Utc>,
    pub failures: Vec<RuleFailure>,
}

impl Report {
    /// Bucket normalized findings and score them
    pub fn build(findings: Vec<Finding>, mode: Mode, failures: Vec<RuleFailure>) -> Self {
        let mut enhancements = Vec::new();
        let mut suggestions = Vec::new();
        let mut conformant = Vec::new();
        for finding in findings {
            match finding.kind {
                FindingKind::Enhancement => enhancements.push(finding),
                FindingKind::Suggestion => suggestions.push(finding),
                FindingKind::Conformant => conformant.push(finding),
            }
        }
        let (value, details) = score(enhancements.len(), suggestions.len(), conformant.len());
        Self {
            enhancements,
            suggestions,
            conformant,
            score: value,
            grade: Grade::from_score(value),
            score_details: details,
            mode,
            timestamp: Utc::now(),
            failures,
        }
    }

    /// Report for a pass that has not happened yet
    pub fn empty(mode: Mode) -> Self {
        Self::build(Vec::new(), mode, Vec::new())
    }

    /// Whether every bucket is empty
    pub fn is_empty(&self) -> bool {
        self.enhancements.is_empty() && self.suggestions.is_empty() && self.conformant.is_empty()
    }

    /// All findings, bucket by bucket
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.enhancements
            .iter()
            .chain(self.suggestions.iter())
            .chain(self.conformant.iter())
    }

    /// Findings from one rule category
    pub fn from_source<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings().filter(move |f| f.source == Some(source))
    }

    /// Copy with suggestions filtered and the score recomputed
    pub fn retain_suggestions(&self, keep: impl Fn(&Finding) -> bool) -> Report {
        let suggestions: Vec<Finding> = self.suggestions.iter().filter(|f| keep(f)).cloned().collect();
        let (value, details) = score(self.enhancements.len(), suggestions.len(), self.conformant.len());
        Report {
            suggestions,
            score: value,
            grade: Grade::from_score(value),
            score_details: details,
            ..self.clone()
        }
    }

    /// DOM-free projection of this report
    pub fn to_serializable(&self, tree: &DomTree) -> SerializableReport {
        let project = |items: &[Finding]| {
            items
                .iter()
                .map(|f| SerializableFinding::from_finding(f, tree))
                .collect()
        };
        SerializableReport {
            enhancements: project(&self.enhancements),
            suggestions: project(&self.suggestions),
            conformant: project(&self.conformant),
            score: self.score,
            grade: self.grade,
            score_details: self.score_details,
            mode: self.mode,
            timestamp: self.timestamp,
            failures: self.failures.clone(),
        }
    }
}

/// Finding without node references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableFinding {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_ref: Option<String>,
    /// Always present; `null` when the node cannot be addressed
    pub selector: Option<String>,
}

impl SerializableFinding {
    fn from_finding(finding: &Finding, tree: &DomTree) -> Self {
        Self {
            message: finding.message.clone(),
            fix: finding.fix.clone(),
            description: finding.description.clone(),
            source: finding.source.unwrap_or_default().to_string(),
            kind: finding.kind,
            severity: finding.severity,
            rule_ref: finding.rule_ref.clone(),
            selector: finding.element.and_then(|node| selector_for(tree, node)),
        }
    }
}

/// Report without node references, ready for JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableReport {
    pub enhancements: Vec<SerializableFinding>,
    pub suggestions: Vec<SerializableFinding>,
    pub conformant: Vec<SerializableFinding>,
    pub score: u8,
    pub grade: Grade,
    pub score_details: ScoreDetails,
    pub mode: Mode,
    pub timestamp: DateTime<Utc>,
    pub failures: Vec<RuleFailure>,
}

impl SerializableReport {
    pub fn to_json(&self) -> Result<String, A11yError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, A11yError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

static IDENTIFIER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Za-z][\w-]*$").ok());

fn is_identifier(value: &str) -> bool {
    IDENTIFIER.as_ref().is_some_and(|re| re.is_match(value))
}

/// Structural selector for an element.
///
/// `#id` when the element has a usable id, otherwise a `>` path of
/// `tag.class:nth-of-type(n)` segments anchored at the nearest ancestor
/// with a usable id, or at `html`. `None` for detached or non-element
/// nodes.
pub fn selector_for(tree: &DomTree, node: NodeId) -> Option<String> {
    tree.element(node)?;
    if !tree.is_attached(node) {
        return None;
    }

    let mut segments = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        let elem = tree.element(id)?;
        if let Some(anchor) = elem.id().filter(|v| is_identifier(v)) {
            segments.push(format!("#{anchor}"));
            break;
        }
        if elem.name == "html" {
            segments.push("html".to_string());
            break;
        }
        segments.push(segment(tree, id));
        current = tree.parent_element(id);
    }
    segments.reverse();
    Some(segments.join(" > "))
}

fn segment(tree: &DomTree, node: NodeId) -> String {
    let Some(elem) = tree.element(node) else {
        return String::new();
    };
    let mut out = elem.name.clone();
    if let Some(class) = elem.classes().find(|c| is_identifier(c)) {
        out.push('.');
        out.push_str(class);
    }
    if let Some(parent) = tree.parent(node) {
        let same_tag: Vec<NodeId> = tree
            .element_children(parent)
            .filter(|&c| tree.is_tag(c, &elem.name))
            .collect();
        if same_tag.len() > 1 {
            if let Some(position) = same_tag.iter().position(|&c| c == node) {
                out.push_str(&format!(":nth-of-type({})", position + 1));
            }
        }
    }
    out
}
