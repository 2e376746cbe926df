//! Focus visibility
//!
//! Every visible focusable element must draw an outline or a box shadow
//! when it has keyboard focus. Audit mode reports each bare element.
//! Enhance mode injects one `:focus-visible` stylesheet, marked by
//! [`FOCUS_STYLE_ID`], instead of touching the elements.

use super::{normalized_text, select};
use crate::{Finding, NAME_BUDGET, RuleResult, truncate_for_display};
use lumen_css::StyleResolver;
use lumen_dom::{Document, DomTree, MatchState, NodeId};

/// Marker id of the injected stylesheet
pub const FOCUS_STYLE_ID: &str = "lumen-focus-styles";

const FOCUS_STYLES: &str = ":focus-visible { outline: 3px solid #005fcc !important; outline-offset: 2px }";
const FOCUSABLE_SELECTOR: &str = "a[href], button:not([disabled]), input:not([disabled]):not([type=hidden]), select:not([disabled]), textarea:not([disabled]), [tabindex]:not([tabindex=\"-1\"])";
const RULE_REF: &str = "10.7";

#[derive(Debug, Clone)]
pub struct FocusRule {
    audit_only: bool,
    inject_styles: bool,
}

impl FocusRule {
    pub fn new(audit_only: bool, inject_styles: bool) -> Self {
        Self {
            audit_only,
            inject_styles,
        }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let gaps = focus_gaps(document)?;
        if gaps.is_empty() {
            return Ok(Vec::new());
        }

        let has_marker = document.get_element_by_id(FOCUS_STYLE_ID).is_some();
        if !self.audit_only && self.inject_styles && !has_marker {
            let style = inject_focus_styles(document)?;
            tracing::debug!("Injected focus styles for {} element(s)", gaps.len());
            return Ok(vec![
                Finding::enhancement(format!(
                    "Global :focus-visible style injected ({} element(s) without focus indicator)",
                    gaps.len()
                ))
                .with_description("A stylesheet now draws a visible outline around any element focused with the keyboard.")
                .with_rule_ref(RULE_REF)
                .on(style),
            ]);
        }

        let tree = &document.tree;
        Ok(gaps
            .into_iter()
            .map(|element| {
                Finding::suggestion(format!("Focus not visible: {}", describe(tree, element)))
                    .with_fix("Give the element a visible :focus-visible outline or box-shadow.")
                    .with_rule_ref(RULE_REF)
                    .on(element)
            })
            .collect())
    }
}

/// Visible focusable elements that draw nothing when focused
fn focus_gaps(document: &Document) -> RuleResult<Vec<NodeId>> {
    let tree = &document.tree;
    let resolver = StyleResolver::from_document(document);
    Ok(select(tree, FOCUSABLE_SELECTOR)?
        .into_iter()
        .filter(|&el| resolver.is_visible(tree, el))
        .filter(|&el| {
            !resolver
                .computed(tree, el, &MatchState::focused(el))
                .has_focus_indicator()
        })
        .collect())
}

fn inject_focus_styles(document: &mut Document) -> RuleResult<NodeId> {
    let parent = document
        .head()
        .or_else(|| document.document_element())
        .unwrap_or(NodeId::ROOT);
    let tree = &mut document.tree;
    let style = tree.create_element("style");
    tree.set_attribute(style, "id", FOCUS_STYLE_ID)?;
    let css = tree.create_text(FOCUS_STYLES);
    tree.append_child(style, css)?;
    tree.append_child(parent, style)?;
    Ok(style)
}

/// `<tag> "text…"`, using the value or aria-label when there is no text
fn describe(tree: &DomTree, element: NodeId) -> String {
    let tag = tree.tag_name(element).unwrap_or("element");
    let text = normalized_text(tree, element);
    let text = if text.is_empty() {
        ["value", "aria-label"]
            .iter()
            .find_map(|attr| tree.attr_trimmed(element, attr))
            .unwrap_or_default()
            .to_string()
    } else {
        text
    };
    if text.is_empty() {
        format!("<{tag}>")
    } else {
        format!("<{tag}> \"{}\"", truncate_for_display(&text, NAME_BUDGET))
    }
}
