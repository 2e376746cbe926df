//! Document title and viewport

use super::{normalized_text, select};
use crate::{DISPLAY_BUDGET, Finding, RuleResult, Severity, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId};

const TITLE_RULE_REF: &str = "8.5";
const ZOOM_RULE_REF: &str = "10.4";

/// Lowest `maximum-scale` that still allows 200% zoom
const MIN_MAXIMUM_SCALE: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct DocumentRule {
    audit_only: bool,
}

impl DocumentRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let tree = &document.tree;
        let mut findings = Vec::new();

        match document_title(tree)? {
            None => {
                let anchor = document.head().or_else(|| document.document_element());
                let mut finding = Finding::suggestion("No <title> element in the document")
                    .with_fix("Add a <title> describing the page inside <head>.")
                    .with_severity(Severity::Error)
                    .with_rule_ref(TITLE_RULE_REF);
                if let Some(anchor) = anchor {
                    finding = finding.on(anchor);
                }
                findings.push(finding);
            }
            Some(title) => {
                let text = normalized_text(tree, title);
                if text.is_empty() {
                    findings.push(
                        Finding::suggestion("Empty <title> element")
                            .with_fix("Write a title describing the page.")
                            .with_severity(Severity::Error)
                            .with_rule_ref(TITLE_RULE_REF)
                            .on(title),
                    );
                } else if self.audit_only {
                    findings.push(
                        Finding::conformant(format!(
                            "Document title: {}",
                            truncate_for_display(&text, DISPLAY_BUDGET)
                        ))
                        .on(title),
                    );
                }
            }
        }

        for meta in select(tree, "meta[name=viewport i]")? {
            let content = tree.attr(meta, "content").unwrap_or_default();
            if blocks_zoom(content) {
                findings.push(
                    Finding::suggestion("Viewport prevents zooming")
                        .with_fix("Remove user-scalable=no and any maximum-scale below 2 from the viewport meta.")
                        .with_rule_ref(ZOOM_RULE_REF)
                        .on(meta),
                );
            }
        }

        Ok(findings)
    }
}

/// First `<title>` outside inline SVG
fn document_title(tree: &DomTree) -> RuleResult<Option<NodeId>> {
    Ok(select(tree, "title")?
        .into_iter()
        .find(|&t| !tree.ancestors(t).any(|a| tree.is_tag(a, "svg"))))
}

fn blocks_zoom(content: &str) -> bool {
    content
        .split([',', ';'])
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| {
            let value = value.trim().to_ascii_lowercase();
            match key.trim().to_ascii_lowercase().as_str() {
                "user-scalable" => value == "no" || value == "0",
                "maximum-scale" => value.parse::<f32>().is_ok_and(|scale| scale < MIN_MAXIMUM_SCALE),
                _ => false,
            }
        })
}
