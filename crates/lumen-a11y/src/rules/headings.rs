//! Heading hierarchy (read-only)

use super::{normalized_text, select};
use crate::{Finding, NAME_BUDGET, RuleResult, Severity, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId};

#[derive(Debug, Clone)]
pub struct HeadingRule {
    audit_only: bool,
}

impl HeadingRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let tree = &document.tree;
        let headings: Vec<(NodeId, u8)> = select(tree, "h1, h2, h3, h4, h5, h6")?
            .into_iter()
            .filter_map(|h| heading_level(tree, h).map(|level| (h, level)))
            .collect();
        tracing::debug!(audit_only = self.audit_only, "Checking {} heading(s)", headings.len());
        let Some(&(first, _)) = headings.first() else {
            return Ok(Vec::new());
        };

        let mut findings = Vec::new();
        let h1s: Vec<NodeId> = headings.iter().filter(|(_, l)| *l == 1).map(|(h, _)| *h).collect();
        match h1s.len() {
            0 => findings.push(
                Finding::suggestion("No h1 on the page")
                    .with_fix("Give the page one <h1> describing its main content.")
                    .with_severity(Severity::Error)
                    .on(first),
            ),
            1 => {}
            count => {
                for &h1 in &h1s {
                    findings.push(
                        Finding::suggestion(format!("Multiple h1 ({count} total)"))
                            .with_fix("Keep a single <h1> and demote the others.")
                            .on(h1),
                    );
                }
            }
        }

        for pair in headings.windows(2) {
            let (_, previous) = pair[0];
            let (heading, level) = pair[1];
            if level > previous + 1 {
                findings.push(
                    Finding::suggestion(format!(
                        "Level skip: h{previous} followed by h{level} ({})",
                        truncate_for_display(&normalized_text(tree, heading), NAME_BUDGET)
                    ))
                    .with_fix(format!("Use an h{} here or add the missing levels.", previous + 1))
                    .on(heading),
                );
            }
        }
        Ok(findings)
    }
}

fn heading_level(tree: &DomTree, node: NodeId) -> Option<u8> {
    let name = tree.tag_name(node)?;
    let digit = name.strip_prefix('h')?;
    digit.parse::<u8>().ok().filter(|l| (1..=6).contains(l))
}
