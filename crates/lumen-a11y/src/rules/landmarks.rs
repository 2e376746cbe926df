//! Landmark regions

use super::{has_value, select};
use crate::{Finding, RuleResult, Severity};
use lumen_css::StyleResolver;
use lumen_dom::{Document, DomTree, NodeId};

struct Landmark {
    tag: &'static str,
    /// Explicit role mirrored onto the element, when the tag gets one
    role: Option<&'static str>,
    label: &'static str,
}

const LANDMARKS: &[Landmark] = &[
    Landmark { tag: "main", role: Some("main"), label: "Main content" },
    Landmark { tag: "nav", role: Some("navigation"), label: "Main navigation" },
    Landmark { tag: "header", role: None, label: "Header" },
    Landmark { tag: "footer", role: None, label: "Footer" },
    Landmark { tag: "aside", role: None, label: "Complementary content" },
];

#[derive(Debug, Clone)]
pub struct LandmarkRule {
    audit_only: bool,
}

impl LandmarkRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();
        audit_main_count(document, &mut findings)?;

        for landmark in LANDMARKS {
            let mut unlabelled_navs = 0usize;
            for node in select(&document.tree, landmark.tag)? {
                if let Some(role) = landmark.role
                    && !has_value(&document.tree, node, "role")
                {
                    findings.push(self.add_role(document, node, landmark.tag, role)?);
                }

                let tree = &document.tree;
                if has_value(tree, node, "aria-label") || has_value(tree, node, "aria-labelledby") {
                    if self.audit_only {
                        findings.push(Finding::conformant(format!("Landmark <{}> labelled", landmark.tag)).on(node));
                    }
                    continue;
                }

                let label = if landmark.tag == "nav" && unlabelled_navs > 0 {
                    format!("Navigation {}", unlabelled_navs + 1)
                } else {
                    landmark.label.to_string()
                };
                if landmark.tag == "nav" {
                    unlabelled_navs += 1;
                }
                findings.push(self.add_label(document, node, landmark.tag, &label)?);
            }
        }
        Ok(findings)
    }

    fn add_role(&self, document: &mut Document, node: NodeId, tag: &str, role: &str) -> RuleResult<Finding> {
        if self.audit_only {
            return Ok(Finding::suggestion(format!("<{tag}> without role=\"{role}\""))
                .with_fix(format!("Add role=\"{role}\" for older assistive technologies."))
                .with_severity(Severity::Info)
                .on(node));
        }
        document.tree.set_attribute(node, "role", role)?;
        Ok(Finding::enhancement(format!("role=\"{role}\" added to <{tag}>")).on(node))
    }

    fn add_label(&self, document: &mut Document, node: NodeId, tag: &str, label: &str) -> RuleResult<Finding> {
        if self.audit_only {
            return Ok(Finding::suggestion(format!("<{tag}> without accessible name"))
                .with_fix(format!("Add aria-label=\"{label}\" or an aria-labelledby."))
                .with_severity(Severity::Info)
                .on(node));
        }
        document.tree.set_attribute(node, "aria-label", label)?;
        Ok(Finding::enhancement(format!("aria-label \"{label}\" added to <{tag}>")).on(node))
    }
}

/// More than one visible `<main>` is an error on each; none at all is a warning
fn audit_main_count(document: &Document, findings: &mut Vec<Finding>) -> RuleResult<()> {
    let tree = &document.tree;
    let mains = select(tree, "main")?;
    if mains.is_empty() {
        if select(tree, "[role=main]")?.is_empty()
            && let Some(body) = document.body()
        {
            findings.push(
                Finding::suggestion("No main landmark")
                    .with_fix("Wrap the page's main content in a <main> element.")
                    .on(body),
            );
        }
        return Ok(());
    }
    if mains.len() == 1 {
        return Ok(());
    }

    let resolver = StyleResolver::from_document(document);
    let visible: Vec<NodeId> = mains
        .into_iter()
        .filter(|&m| is_shown(&resolver, tree, m))
        .collect();
    if visible.len() > 1 {
        let count = visible.len();
        findings.extend(visible.into_iter().map(|main| {
            Finding::suggestion(format!("Multiple visible <main> ({count} total)"))
                .with_fix("Keep one visible <main> per page; hide the others with the hidden attribute.")
                .with_severity(Severity::Error)
                .on(main)
        }));
    }
    Ok(())
}

fn is_shown(resolver: &StyleResolver, tree: &DomTree, node: NodeId) -> bool {
    !tree.has_attr(node, "hidden") && resolver.is_visible(tree, node)
}
