//! Skip link

use super::select;
use crate::{Finding, RuleResult};
use lumen_dom::{Document, NodeId};

/// Marker id of the injected link
pub const SKIP_LINK_ID: &str = "lumen-skip-link";

const SKIP_LINK_CLASS: &str = "lumen-skip-link";
const SKIP_LINK_TEXT: &str = "Skip to main content";
const MAIN_ID: &str = "main-content";
const RULE_REF: &str = "12.6";
const HIDDEN_UNTIL_FOCUS: &str =
    "position:absolute;left:-9999px;top:0;z-index:9999;padding:0.5rem 1rem;background:#000;color:#fff;";

/// Ensures keyboard users can jump past the navigation
#[derive(Debug, Clone)]
pub struct SkipLinkRule {
    audit_only: bool,
}

impl SkipLinkRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let Some(body) = document.body() else {
            return Ok(Vec::new());
        };
        let existing = match document.get_element_by_id(SKIP_LINK_ID) {
            Some(link) => Some(link),
            None => select(&document.tree, "body > a[href^=\"#\"]")?.first().copied(),
        };

        if self.audit_only {
            return Ok(vec![match existing {
                Some(link) => Finding::conformant("Skip link present").on(link),
                None => Finding::suggestion("Skip link missing")
                    .with_fix("Add a \"Skip to main content\" link at the start of the page pointing at the main region.")
                    .with_rule_ref(RULE_REF)
                    .on(body),
            }]);
        }
        if existing.is_some() {
            return Ok(Vec::new());
        }

        let target_id = self.ensure_target(document)?;
        let tree = &mut document.tree;
        let link = tree.create_element("a");
        tree.set_attribute(link, "id", SKIP_LINK_ID)?;
        tree.set_attribute(link, "href", &format!("#{target_id}"))?;
        tree.set_attribute(link, "tabindex", "0")?;
        tree.set_attribute(link, "class", SKIP_LINK_CLASS)?;
        tree.set_attribute(link, "style", HIDDEN_UNTIL_FOCUS)?;
        let text = tree.create_text(SKIP_LINK_TEXT);
        tree.append_child(link, text)?;

        let first = tree.children(body).next().map(|(id, _)| id);
        tree.insert_before(body, link, first)?;
        tracing::debug!("Injected skip link targeting #{}", target_id);

        Ok(vec![
            Finding::enhancement(format!("Skip link \"{SKIP_LINK_TEXT}\" injected at the start of the page"))
                .with_description("A skip link lets keyboard users jump straight to the main content without tabbing through the navigation.")
                .with_rule_ref(RULE_REF)
                .on(link),
        ])
    }

    /// Id of the main region, assigning one when it has none
    fn ensure_target(&self, document: &mut Document) -> RuleResult<String> {
        let main: Option<NodeId> = select(&document.tree, "main, [role=main], #main")?.first().copied();
        let Some(main) = main else {
            return Ok(MAIN_ID.to_string());
        };
        if let Some(id) = document.tree.attr_trimmed(main, "id") {
            return Ok(id.to_string());
        }
        document.tree.set_attribute(main, "id", MAIN_ID)?;
        Ok(MAIN_ID.to_string())
    }
}
