//! Page language

use crate::{Finding, RuleResult, Severity};
use lumen_dom::Document;

const RULE_REF: &str = "8.6";

/// Checks `lang` on the root element and sets a default when missing
#[derive(Debug, Clone)]
pub struct LangRule {
    audit_only: bool,
    default_language: String,
}

impl LangRule {
    pub fn new(audit_only: bool, default_language: &str) -> Self {
        Self {
            audit_only,
            default_language: default_language.to_string(),
        }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let Some(html) = document.document_element() else {
            return Ok(Vec::new());
        };

        if let Some(lang) = document.tree.attr_trimmed(html, "lang") {
            if self.audit_only {
                return Ok(vec![
                    Finding::conformant(format!("Language defined on <html> ({lang})")).on(html),
                ]);
            }
            return Ok(Vec::new());
        }

        if self.audit_only {
            return Ok(vec![
                Finding::suggestion("Missing lang attribute on <html>")
                    .with_fix(format!(
                        "Add the page language to the root element, e.g. <html lang=\"{}\">.",
                        self.default_language
                    ))
                    .with_severity(Severity::Error)
                    .with_rule_ref(RULE_REF)
                    .on(html),
            ]);
        }

        document.tree.set_attribute(html, "lang", &self.default_language)?;
        tracing::debug!("Set lang=\"{}\" on <html>", self.default_language);
        Ok(vec![
            Finding::enhancement(format!("lang=\"{}\" added to <html>", self.default_language))
                .with_description("The lang attribute tells screen readers which language to read the page in.")
                .with_rule_ref(RULE_REF)
                .on(html),
        ])
    }
}
