//! Frame titles

use super::{select, short_source};
use crate::{Finding, RuleResult, Severity};

use lumen_dom::Document;

const DEFAULT_TITLE: &str = "Embedded content";
const RULE_REF: &str = "2.1";

#[derive(Debug, Clone)]
pub struct FrameRule {
    audit_only: bool,
}

impl FrameRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();
        for frame in select(&document.tree, "iframe, frame")? {
            if document.tree.attr_trimmed(frame, "title").is_some() {
                continue;
            }
            let source = document
                .tree
                .attr_trimmed(frame, "src")
                .map_or_else(|| "(no src)".to_string(), short_source);

            let finding = if self.audit_only {
                Finding::suggestion(format!("Frame without title: {source}"))
                    .with_fix("Add a title describing the frame's content: <iframe src=\"…\" title=\"…\">.")
                    .with_severity(Severity::Error)
            } else {
                document.tree.set_attribute(frame, "title", DEFAULT_TITLE)?;
                Finding::enhancement(format!("title=\"{DEFAULT_TITLE}\" added to frame: {source}"))
                    .with_description("A generic title now names the frame for screen readers; replace it with a precise description.")
            };
            findings.push(finding.with_rule_ref(RULE_REF).on(frame));
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FindingKind;

    #[test]
    fn test_frames() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let map = doc.tree.create_element("iframe");
        doc.tree.set_attribute(map, "src", "https://maps.example.com/embed?q=paris").unwrap();
        let titled = doc.tree.create_element("iframe");
        doc.tree.set_attribute(titled, "title", "Checkout").unwrap();
        doc.tree.append_child(body, map).unwrap();
        doc.tree.append_child(body, titled).unwrap();

        let audit = FrameRule::new(true).run(&mut doc).unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].message, "Frame without title: embed");
        assert_eq!(audit[0].severity, Severity::Error);
        assert!(!doc.tree.has_attr(map, "title"));

        let enhanced = FrameRule::new(false).run(&mut doc).unwrap();
        assert_eq!(enhanced[0].kind, FindingKind::Enhancement);
        assert_eq!(doc.tree.attr(map, "title"), Some("Embedded content"));
        assert!(FrameRule::new(false).run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_blank_title_counts_as_missing() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let frame = doc.tree.create_element("iframe");
        doc.tree.set_attribute(frame, "title", "  ").unwrap();
        doc.tree.append_child(body, frame).unwrap();
        let findings = FrameRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings[0].message, "Frame without title: (no src)");
    }
}
