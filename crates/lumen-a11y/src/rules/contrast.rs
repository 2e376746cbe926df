//! Text contrast
//!
//! Checks every leaf text element (one that holds text and no other
//! candidate) against WCAG AA. The background is the first opaque
//! background found walking up from the element to `<body>`; white when
//! there is none. Read-only in both modes.

use super::{normalized_text, select};
use crate::{DISPLAY_BUDGET, Finding, RuleResult, truncate_for_display};
use lumen_css::{Color, ComputedStyle, ContrastChecker, StyleResolver};
use lumen_dom::{Document, DomTree, MatchState, NodeId};

const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "a", "li", "td", "th", "label", "figcaption", "blockquote",
];

#[derive(Debug, Clone)]
pub struct ContrastRule {
    audit_only: bool,
}

impl ContrastRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let tree = &document.tree;
        let body = document.body();
        let resolver = StyleResolver::from_document(document);
        let candidates = text_elements(tree)?;
        tracing::debug!(
            audit_only = self.audit_only,
            "Checking contrast of {} text element(s) against {} stylesheet(s)",
            candidates.len(),
            resolver.stylesheet_count()
        );

        let mut findings = Vec::new();
        for element in candidates {
            let chain = resolver.style_chain(tree, element, &MatchState::default());
            let Some(own) = chain.last() else {
                continue;
            };
            if own.visibility_hidden || chain.iter().any(|s| s.display_none) {
                continue;
            }

            let background = effective_background(tree, element, &chain, body);
            let ratio = ContrastChecker::contrast_ratio(own.color.over(background), background);
            let large = ContrastChecker::is_large_text(own.font_size_px, own.is_bold());
            if ContrastChecker::meets_aa(ratio, large) {
                continue;
            }
            findings.push(
                Finding::suggestion(format!(
                    "Insufficient contrast ({ratio:.1}:1) : {}",
                    truncate_for_display(&normalized_text(tree, element), DISPLAY_BUDGET)
                ))
                .with_fix(format!(
                    "Raise the contrast between {} and {} to at least {:.1}:1.",
                    own.color,
                    background,
                    ContrastChecker::required_ratio(large)
                ))
                .on(element),
            );
        }
        Ok(findings)
    }
}

/// Candidates with text of their own and no nested candidate
fn text_elements(tree: &DomTree) -> RuleResult<Vec<NodeId>> {
    let selector = TEXT_TAGS.join(", ");
    Ok(select(tree, &selector)?
        .into_iter()
        .filter(|&el| !tree.text_content(el).trim().is_empty())
        .filter(|&el| {
            !tree
                .descendant_elements(el)
                .any(|d| TEXT_TAGS.iter().any(|tag| tree.is_tag(d, tag)))
        })
        .collect())
}

/// `chain` runs from the outermost ancestor down to `element`
fn effective_background(tree: &DomTree, element: NodeId, chain: &[ComputedStyle], body: Option<NodeId>) -> Color {
    let path = std::iter::once(element).chain(tree.ancestors(element).filter(|&a| tree.element(a).is_some()));
    for (node, style) in path.zip(chain.iter().rev()) {
        if !style.background_color.is_transparent() {
            return style.background_color.over(Color::WHITE);
        }
        if Some(node) == body {
            break;
        }
    }
    Color::WHITE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &mut Document, parent: NodeId, style: &str, text: &str) -> NodeId {
        let p = doc.tree.create_element("p");
        doc.tree.set_attribute(p, "style", style).unwrap();
        doc.tree.append_child(parent, p).unwrap();
        let t = doc.tree.create_text(text);
        doc.tree.append_child(p, t).unwrap();
        p
    }

    #[test]
    fn test_grey_on_white_fails() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        doc.tree.set_attribute(body, "style", "background:#fff").unwrap();
        let p = paragraph(&mut doc, body, "color:#999", "Shipping is free on orders over 50 euros");

        let findings = ContrastRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Insufficient contrast (2.8:1) : Shipping is free"));
        assert!(findings[0].message.ends_with('…'));
        assert_eq!(findings[0].element, Some(p));
    }

    #[test]
    fn test_dark_text_passes_and_large_text_threshold() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        paragraph(&mut doc, body, "color:#333", "Readable");
        // #949494 on white is about 3.0:1, enough for large text only
        paragraph(&mut doc, body, "color:#949494; font-size:24px", "Large");
        let small = paragraph(&mut doc, body, "color:#949494", "Small");

        let findings = ContrastRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].element, Some(small));
    }

    #[test]
    fn test_background_comes_from_ancestor() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let panel = doc.tree.create_element("div");
        doc.tree.set_attribute(panel, "style", "background-color:#000").unwrap();
        doc.tree.append_child(body, panel).unwrap();
        paragraph(&mut doc, panel, "color:#111", "Dark on dark");
        paragraph(&mut doc, panel, "color:#fff", "Light on dark");

        let findings = ContrastRule::new(false).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Dark on dark"));
    }

    #[test]
    fn test_hidden_and_wrapper_elements_are_skipped() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        paragraph(&mut doc, body, "color:#eee; display:none", "Hidden");
        let outer = paragraph(&mut doc, body, "color:#eee", "");
        let span = doc.tree.create_element("span");
        doc.tree.append_child(outer, span).unwrap();
        let t = doc.tree.create_text("Inner");
        doc.tree.append_child(span, t).unwrap();

        let findings = ContrastRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].element, Some(span));
    }
}
