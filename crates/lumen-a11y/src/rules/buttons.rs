//! Call-to-action buttons in product listings
//!
//! A page with twenty "Add to cart" buttons gives a screen reader user
//! twenty identical names. Buttons matching a generic call-to-action get
//! the product name from the surrounding card appended to their label.

use super::{has_value, normalized_text, select};
use crate::{DISPLAY_BUDGET, Finding, RuleResult, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId, Selector};
use regex::Regex;
use std::sync::LazyLock;

const CALL_TO_ACTION_PATTERNS: &[&str] = &[
    r"(?i)ajouter\s+(au\s+)?panier",
    r"(?i)add\s+to\s+cart",
    r"(?i)acheter",
    r"(?i)buy\s+now",
    r"(?i)commander",
    r"(?i)order\s+now",
];

static CALL_TO_ACTION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CALL_TO_ACTION_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

const BUTTON_SELECTOR: &str = "button, [role=button], input[type=submit], input[type=button]";

/// Product names longer than this are not names
const MAX_PRODUCT_NAME_CHARS: usize = 200;

fn is_call_to_action(text: &str) -> bool {
    CALL_TO_ACTION.iter().any(|re| re.is_match(text))
}

/// Adds product context to generic call-to-action buttons
#[derive(Debug, Clone)]
pub struct ButtonRule {
    audit_only: bool,
    product_selectors: Vec<Selector>,
}

impl ButtonRule {
    pub fn new(audit_only: bool, selectors: Vec<String>) -> Self {
        let product_selectors = selectors
            .iter()
            .filter_map(|source| match Selector::parse(source) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    tracing::warn!("Ignoring product-name selector '{}': {}", source, err);
                    None
                }
            })
            .collect();
        Self {
            audit_only,
            product_selectors,
        }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let body = document.body();
        let mut findings = Vec::new();

        for button in select(&document.tree, BUTTON_SELECTOR)? {
            let tree = &document.tree;
            let text = button_text(tree, button);
            if text.is_empty() || !is_call_to_action(&text) {
                continue;
            }

            if let Some(label) = tree.attr(button, "aria-label").filter(|l| !l.is_empty()) {
                if self.audit_only {
                    findings.push(
                        Finding::conformant(format!(
                            "Product button labelled: {}",
                            truncate_for_display(label, DISPLAY_BUDGET)
                        ))
                        .on(button),
                    );
                }
                continue;
            }

            let product = self.find_product_name(tree, button, body);
            if self.audit_only {
                let fix = match &product {
                    Some(name) => format!("Add aria-label=\"{text} : {name}\" so the button names its product."),
                    None => "Add an aria-label that names the product, e.g. \"Add to cart : <product>\".".to_string(),
                };
                findings.push(
                    Finding::suggestion(format!(
                        "Generic button without product context: {}",
                        truncate_for_display(&text, DISPLAY_BUDGET)
                    ))
                    .with_fix(fix)
                    .on(button),
                );
                continue;
            }

            let Some(product) = product else {
                tracing::debug!("No product name found around button {}", button);
                continue;
            };
            document
                .tree
                .set_attribute(button, "aria-label", &format!("{text} : {product}"))?;
            findings.push(
                Finding::enhancement(format!(
                    "Button enhanced: {} ({})",
                    truncate_for_display(&text, DISPLAY_BUDGET),
                    truncate_for_display(&product, DISPLAY_BUDGET)
                ))
                .with_description("The product name was added to the button's accessible name.")
                .on(button),
            );
        }
        Ok(findings)
    }

    /// Walk up from the button, stopping below `<body>`, and return the first
    /// usable product name any selector finds inside an ancestor
    fn find_product_name(&self, tree: &DomTree, button: NodeId, body: Option<NodeId>) -> Option<String> {
        let mut ancestor = tree.parent_element(button);
        while let Some(scope) = ancestor {
            if Some(scope) == body {
                break;
            }
            for selector in &self.product_selectors {
                let Some(found) = tree.query_selector(scope, selector) else {
                    continue;
                };
                let name = match tree.attr_trimmed(found, "data-product-name") {
                    Some(name) => name.to_string(),
                    None => normalized_text(tree, found),
                };
                let length = name.chars().count();
                if length > 0 && length < MAX_PRODUCT_NAME_CHARS {
                    return Some(name);
                }
            }
            ancestor = tree.parent_element(scope);
        }
        None
    }
}

/// Visible text, falling back to the `value` of input buttons
fn button_text(tree: &DomTree, button: NodeId) -> String {
    let text = normalized_text(tree, button);
    if !text.is_empty() || !has_value(tree, button, "value") {
        return text;
    }
    tree.attr_trimmed(button, "value").unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FindingKind;
    use crate::config::DEFAULT_PRODUCT_NAME_SELECTORS;

    fn defaults() -> Vec<String> {
        DEFAULT_PRODUCT_NAME_SELECTORS.iter().map(|s| s.to_string()).collect()
    }

    fn card(doc: &mut Document, name: &str, label: &str) -> NodeId {
        let body = doc.body().unwrap();
        let tree = &mut doc.tree;
        let article = tree.create_element("article");
        let title = tree.create_element("h3");
        let title_text = tree.create_text(name);
        let button = tree.create_element("button");
        let button_text = tree.create_text(label);
        tree.append_child(body, article).unwrap();
        tree.append_child(article, title).unwrap();
        tree.append_child(title, title_text).unwrap();
        tree.append_child(article, button).unwrap();
        tree.append_child(button, button_text).unwrap();
        button
    }

    #[test]
    fn test_patterns() {
        assert!(is_call_to_action("Ajouter  au panier"));
        assert!(is_call_to_action("ADD TO CART"));
        assert!(is_call_to_action("Buy now"));
        assert!(!is_call_to_action("Read more"));
    }

    #[test]
    fn test_enhance_appends_product_name() {
        let mut doc = Document::new("about:blank");
        let mug = card(&mut doc, "Blue Mug", "Add to cart");
        let cup = card(&mut doc, "Red Cup", "Add to cart");
        let rule = ButtonRule::new(false, defaults());

        let findings = rule.run(&mut doc).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(doc.tree.attr(mug, "aria-label"), Some("Add to cart : Blue Mug"));
        assert_eq!(doc.tree.attr(cup, "aria-label"), Some("Add to cart : Red Cup"));
        assert!(rule.run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_data_attribute_wins_over_text() {
        let mut doc = Document::new("about:blank");
        let button = card(&mut doc, "Ignored", "Buy now");
        let article = doc.tree.parent_element(button).unwrap();
        let title = doc.tree.first_element_child(article).unwrap();
        doc.tree.set_attribute(title, "data-product-name", "Teapot").unwrap();

        ButtonRule::new(false, vec!["[data-product-name]".into()]).run(&mut doc).unwrap();
        assert_eq!(doc.tree.attr(button, "aria-label"), Some("Buy now : Teapot"));
    }

    #[test]
    fn test_no_product_means_no_change() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let button = doc.tree.create_element("button");
        let text = doc.tree.create_text("Add to cart");
        doc.tree.append_child(body, button).unwrap();
        doc.tree.append_child(button, text).unwrap();

        assert!(ButtonRule::new(false, defaults()).run(&mut doc).unwrap().is_empty());
        let audit = ButtonRule::new(true, defaults()).run(&mut doc).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].kind, FindingKind::Suggestion);
    }

    #[test]
    fn test_audit_fix_names_product() {
        let mut doc = Document::new("about:blank");
        let button = card(&mut doc, "Blue Mug", "Add to cart");
        let findings = ButtonRule::new(true, defaults()).run(&mut doc).unwrap();
        assert!(findings[0].fix.as_deref().unwrap().contains("Add to cart : Blue Mug"));
        assert!(!doc.tree.has_attr(button, "aria-label"));
    }

    #[test]
    fn test_invalid_selectors_are_dropped() {
        let rule = ButtonRule::new(false, vec!["h2 + p".into(), "h2".into()]);
        assert_eq!(rule.product_selectors.len(), 1);
    }
}
