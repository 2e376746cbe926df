//! Decorative icons
//!
//! Two cases are handled. An `<a>` or `<button>` whose only content is
//! inline SVG gets its icons hidden from assistive technology, since the
//! control is named some other way or not at all. Any other SVG inside a
//! `div` or `span` that looks decorative (it has intrinsic dimensions and
//! holds no `<text>`) is hidden the same way.

use super::{has_value, normalized_text, select};
use crate::{Finding, RuleResult, Severity};
use lumen_dom::{Document, DomTree, NodeId, NodeData, Selector};

const RULE_REF: &str = "1.2";
const FIX: &str = "Add aria-hidden=\"true\" to the decorative SVG.";

#[derive(Debug, Clone)]
pub struct IconRule {
    audit_only: bool,
}

impl IconRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();

        let mut in_controls = Vec::new();
        for container in select(&document.tree, "a, button")? {
            let tree = &document.tree;
            if !has_only_svg_content(tree, container) {
                continue;
            }
            let tag = tree.tag_name(container).unwrap_or("a").to_string();
            for svg in tree.element_children(container).filter(|&c| tree.is_tag(c, "svg")) {
                let labelled = (tree.attr(svg, "role") == Some("img") && has_value(tree, svg, "aria-label"))
                    || has_value(tree, svg, "aria-labelledby");
                if !is_hidden(tree, svg) && !labelled {
                    in_controls.push((svg, tag.clone()));
                }
            }
        }
        for (svg, tag) in in_controls {
            let finding = if self.audit_only {
                Finding::suggestion(format!("Decorative icon without aria-hidden in <{tag}>")).with_fix(FIX)
            } else {
                document.tree.set_attribute(svg, "aria-hidden", "true")?;
                Finding::enhancement(format!("aria-hidden=\"true\" added to decorative icon in <{tag}>"))
                    .with_description("The icon is hidden from screen readers; the control's own name is announced instead.")
            };
            findings.push(finding.with_severity(Severity::Info).with_rule_ref(RULE_REF).on(svg));
        }

        let control = Selector::parse("a, button")?;
        let isolated: Vec<NodeId> = select(&document.tree, "div svg, span svg")?
            .into_iter()
            .filter(|&svg| is_isolated_decorative(&document.tree, svg, &control))
            .collect();
        for svg in isolated {
            let finding = if self.audit_only {
                Finding::suggestion("Isolated decorative SVG without aria-hidden").with_fix(FIX)
            } else {
                document.tree.set_attribute(svg, "aria-hidden", "true")?;
                Finding::enhancement("aria-hidden=\"true\" added to isolated decorative SVG")
                    .with_description("The SVG carries no text and is hidden from screen readers.")
            };
            findings.push(finding.with_severity(Severity::Info).with_rule_ref(RULE_REF).on(svg));
        }

        Ok(findings)
    }
}

fn is_hidden(tree: &DomTree, svg: NodeId) -> bool {
    tree.attr(svg, "aria-hidden") == Some("true")
}

/// No text at all, at least one `<svg>` child and no other element child
fn has_only_svg_content(tree: &DomTree, container: NodeId) -> bool {
    if !tree.text_content(container).trim().is_empty() {
        return false;
    }
    let mut has_svg = false;
    for (_, child) in tree.children(container) {
        match &child.data {
            NodeData::Element(elem) if elem.name == "svg" => has_svg = true,
            NodeData::Element(_) => return false,
            NodeData::Text(text) if !text.trim().is_empty() => return false,
            _ => {}
        }
    }
    has_svg
}

fn is_isolated_decorative(tree: &DomTree, svg: NodeId, control: &Selector) -> bool {
    if tree.closest(svg, control).is_some()
        || is_hidden(tree, svg)
        || tree.attr(svg, "role") == Some("img")
        || has_value(tree, svg, "aria-label")
        || has_value(tree, svg, "aria-labelledby")
        || tree.ancestors(svg).any(|a| tree.is_tag(a, "svg"))
    {
        return false;
    }
    let titled = tree
        .descendant_elements(svg)
        .filter(|&d| tree.is_tag(d, "title"))
        .any(|t| !normalized_text(tree, t).is_empty());
    !titled && looks_decorative(tree, svg)
}

fn looks_decorative(tree: &DomTree, svg: NodeId) -> bool {
    if tree.descendant_elements(svg).any(|d| tree.is_tag(d, "text")) {
        return false;
    }
    tree.has_attr(svg, "viewBox")
        || leading_number(tree.attr(svg, "width")) > 0.0
        || leading_number(tree.attr(svg, "height")) > 0.0
}

/// Numeric prefix of a dimension such as `24px`, 0 when there is none
fn leading_number(value: Option<&str>) -> f32 {
    let Some(value) = value.map(str::trim) else {
        return 0.0;
    };
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FindingKind;

    fn icon_button(doc: &mut Document, text: Option<&str>) -> (NodeId, NodeId) {
        let body = doc.body().unwrap();
        let button = doc.tree.create_element("button");
        let svg = doc.tree.create_element("svg");
        doc.tree.append_child(body, button).unwrap();
        doc.tree.append_child(button, svg).unwrap();
        if let Some(text) = text {
            let t = doc.tree.create_text(text);
            doc.tree.append_child(button, t).unwrap();
        }
        (button, svg)
    }

    #[test]
    fn test_icon_only_button() {
        let mut doc = Document::new("about:blank");
        let (_, svg) = icon_button(&mut doc, None);
        let findings = IconRule::new(false).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "aria-hidden=\"true\" added to decorative icon in <button>");
        assert_eq!(findings[0].rule_ref.as_deref(), Some("1.2"));
        assert_eq!(doc.tree.attr(svg, "aria-hidden"), Some("true"));
        assert!(IconRule::new(false).run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_button_with_text_is_left_alone() {
        let mut doc = Document::new("about:blank");
        let (_, svg) = icon_button(&mut doc, Some("Search"));
        assert!(IconRule::new(false).run(&mut doc).unwrap().is_empty());
        assert!(!doc.tree.has_attr(svg, "aria-hidden"));
    }

    #[test]
    fn test_labelled_icon_is_kept() {
        let mut doc = Document::new("about:blank");
        let (_, svg) = icon_button(&mut doc, None);
        doc.tree.set_attribute(svg, "role", "img").unwrap();
        doc.tree.set_attribute(svg, "aria-label", "Close").unwrap();
        assert!(IconRule::new(false).run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_isolated_svg() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let div = doc.tree.create_element("div");
        let decorative = doc.tree.create_element("svg");
        let chart = doc.tree.create_element("svg");
        let label = doc.tree.create_element("text");
        doc.tree.append_child(body, div).unwrap();
        doc.tree.append_child(div, decorative).unwrap();
        doc.tree.append_child(div, chart).unwrap();
        doc.tree.append_child(chart, label).unwrap();
        doc.tree.set_attribute(decorative, "width", "24px").unwrap();
        doc.tree.set_attribute(chart, "viewBox", "0 0 10 10").unwrap();

        let findings = IconRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::Suggestion);
        assert_eq!(findings[0].element, Some(decorative));
        assert!(!doc.tree.has_attr(decorative, "aria-hidden"));
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number(Some("24px")), 24.0);
        assert_eq!(leading_number(Some(" 1.5em")), 1.5);
        assert_eq!(leading_number(Some("auto")), 0.0);
        assert_eq!(leading_number(None), 0.0);
    }
}
