//! Links: new-tab links and accessible names

use super::{has_value, normalized_text, select};
use crate::{DISPLAY_BUDGET, Finding, RuleResult, Severity, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId};

/// Appended to labels of links that open a new browsing context
pub const NEW_TAB_SUFFIX: &str = " (opens in a new tab)";

const REQUIRED_REL: [&str; 2] = ["noopener", "noreferrer"];

/// Phrases that already tell the user about the new context
const NEW_CONTEXT_HINTS: &[&str] = &["new tab", "new window", "nouvel onglet", "nouvelle fenêtre"];

/// Secures `target=_blank` links and flags links without a name
#[derive(Debug, Clone)]
pub struct LinkRule {
    audit_only: bool,
}

impl LinkRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();
        for link in select(&document.tree, "a[target=\"_blank\" i]")? {
            if self.audit_only {
                findings.extend(audit_new_tab_link(&document.tree, link));
            } else if let Some(finding) = enhance_new_tab_link(&mut document.tree, link)? {
                findings.push(finding);
            }
        }

        for link in select(&document.tree, "a[href]")? {
            if !has_accessible_name(&document.tree, link) {
                let href = document.tree.attr(link, "href").unwrap_or_default();
                findings.push(
                    Finding::suggestion(format!(
                        "Link without accessible name: {}",
                        truncate_for_display(href, DISPLAY_BUDGET)
                    ))
                    .with_fix("Give the link visible text, an aria-label, or an image with alt text.")
                    .with_severity(Severity::Error)
                    .on(link),
                );
            }
        }
        Ok(findings)
    }
}

fn link_text(tree: &DomTree, link: NodeId) -> String {
    normalized_text(tree, link)
}

fn missing_rel_tokens(tree: &DomTree, link: NodeId) -> Vec<&'static str> {
    let rel = tree.attr(link, "rel").unwrap_or_default().to_ascii_lowercase();
    REQUIRED_REL
        .into_iter()
        .filter(|required| !rel.split_ascii_whitespace().any(|t| t == *required))
        .collect()
}

fn mentions_new_context(text: &str) -> bool {
    let lower = text.to_lowercase();
    NEW_CONTEXT_HINTS.iter().any(|hint| lower.contains(hint))
}

/// The label if there is one, else the text, mentions the new context
fn has_new_context_hint(tree: &DomTree, link: NodeId) -> bool {
    match tree.attr_trimmed(link, "aria-label") {
        Some(label) => mentions_new_context(label),
        None => mentions_new_context(&link_text(tree, link)),
    }
}

fn audit_new_tab_link(tree: &DomTree, link: NodeId) -> Vec<Finding> {
    let text = truncate_for_display(&link_text(tree, link), DISPLAY_BUDGET);
    let mut findings = Vec::new();
    let missing = missing_rel_tokens(tree, link);
    if !missing.is_empty() {
        findings.push(
            Finding::suggestion(format!("New-tab link without rel=\"{}\": {}", missing.join(" "), text))
                .with_fix("Add rel=\"noopener noreferrer\" to links with target=\"_blank\".")
                .on(link),
        );
    }
    if !has_new_context_hint(tree, link) {
        findings.push(
            Finding::suggestion(format!("New-tab link without warning: {text}"))
                .with_fix("Tell users the link opens in a new tab, e.g. in its aria-label.")
                .on(link),
        );
    }
    if findings.is_empty() {
        findings.push(Finding::conformant(format!("New-tab link secured: {text}")).on(link));
    }
    findings
}

fn enhance_new_tab_link(tree: &mut DomTree, link: NodeId) -> RuleResult<Option<Finding>> {
    let mut modified = false;

    let missing = missing_rel_tokens(tree, link);
    if !missing.is_empty() {
        let mut tokens: Vec<String> = tree
            .attr(link, "rel")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect();
        tokens.extend(missing.iter().map(|t| t.to_string()));
        tree.set_attribute(link, "rel", &tokens.join(" "))?;
        modified = true;
    }

    if !has_new_context_hint(tree, link) {
        let label = match tree.attr_trimmed(link, "aria-label") {
            Some(existing) => format!("{existing}{NEW_TAB_SUFFIX}"),
            None => {
                let text = link_text(tree, link);
                if text.is_empty() {
                    "Opens in a new tab".to_string()
                } else {
                    format!("{text}{NEW_TAB_SUFFIX}")
                }
            }
        };
        tree.set_attribute(link, "aria-label", &label)?;
        modified = true;
    }

    if !modified {
        return Ok(None);
    }
    let text = link_text(tree, link);
    let shown = if text.is_empty() { "Link".to_string() } else { truncate_for_display(&text, DISPLAY_BUDGET) };
    Ok(Some(
        Finding::enhancement(format!("Link enhanced: {shown}"))
            .with_description("Added rel=\"noopener noreferrer\" and a new-tab warning to the accessible name.")
            .on(link),
    ))
}

/// Label with every new-context phrase removed
fn without_hint(label: &str) -> String {
    let mut rest = label.to_lowercase();
    for phrase in ["opens in a", "ouvre dans un", "ouvre dans une"] {
        rest = rest.replace(phrase, " ");
    }
    for hint in NEW_CONTEXT_HINTS {
        rest = rest.replace(hint, " ");
    }
    rest.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn has_accessible_name(tree: &DomTree, link: NodeId) -> bool {
    if let Some(label) = tree.attr_trimmed(link, "aria-label") {
        if !without_hint(label).is_empty() {
            return true;
        }
    }
    if has_value(tree, link, "aria-labelledby") || has_value(tree, link, "title") {
        return true;
    }
    if !link_text(tree, link).is_empty() {
        return true;
    }
    tree.descendant_elements(link).any(|child| {
        (tree.is_tag(child, "img") && has_value(tree, child, "alt"))
            || has_value(tree, child, "aria-label")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FindingKind;

    fn page(link_attrs: &[(&str, &str)], text: &str) -> (Document, NodeId) {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let link = doc.tree.create_element("a");
        doc.tree.append_child(body, link).unwrap();
        for (name, value) in link_attrs {
            doc.tree.set_attribute(link, name, value).unwrap();
        }
        if !text.is_empty() {
            let t = doc.tree.create_text(text);
            doc.tree.append_child(link, t).unwrap();
        }
        (doc, link)
    }

    #[test]
    fn test_enhance_merges_rel_tokens() {
        let (mut doc, link) = page(&[("href", "/x"), ("target", "_blank"), ("rel", "external noopener")], "Docs");
        let findings = LinkRule::new(false).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(doc.tree.attr(link, "rel"), Some("external noopener noreferrer"));
        assert_eq!(doc.tree.attr(link, "aria-label"), Some("Docs (opens in a new tab)"));
        assert!(LinkRule::new(false).run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_existing_label_gets_suffix() {
        let (mut doc, link) = page(&[("href", "/x"), ("target", "_blank"), ("aria-label", "Annual report")], "PDF");
        LinkRule::new(false).run(&mut doc).unwrap();
        assert_eq!(doc.tree.attr(link, "aria-label"), Some("Annual report (opens in a new tab)"));
    }

    #[test]
    fn test_audit_reports_each_gap() {
        let (mut doc, link) = page(&[("href", "/x"), ("target", "_blank")], "Docs");
        let findings = LinkRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.kind == FindingKind::Suggestion));
        assert!(!doc.tree.has_attr(link, "rel"));

        let (mut doc, _) = page(
            &[("href", "/x"), ("target", "_blank"), ("rel", "noopener noreferrer")],
            "Docs (new tab)",
        );
        let findings = LinkRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::Conformant);
    }

    #[test]
    fn test_empty_link_keeps_failing_name_check() {
        let (mut doc, link) = page(&[("href", "/x"), ("target", "_blank")], "");
        let findings = LinkRule::new(false).run(&mut doc).unwrap();
        assert_eq!(doc.tree.attr(link, "aria-label"), Some("Opens in a new tab"));
        assert!(findings.iter().any(|f| f.severity == Severity::Error));

        let second = LinkRule::new(false).run(&mut doc).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, FindingKind::Suggestion);
    }

    #[test]
    fn test_image_alt_names_link() {
        let (mut doc, link) = page(&[("href", "/")], "");
        let img = doc.tree.create_element("img");
        doc.tree.set_attribute(img, "alt", "Home").unwrap();
        doc.tree.append_child(link, img).unwrap();
        assert!(LinkRule::new(true).run(&mut doc).unwrap().is_empty());
    }
}
