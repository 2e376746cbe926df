//! Text alternatives for images and image-like elements.
//!
//! Read-only in both modes: a useful alternative cannot be invented.

use super::{has_value, normalized_text, select, short_source};
use crate::{DISPLAY_BUDGET, Finding, RuleResult, Severity, truncate_for_display};
use lumen_dom::{Document, DomTree, NodeId};

const DECORATIVE_SRC_HINTS: &[&str] = &["/icon", "/spacer", "/decoration", "/bullet", "/arrow", "placeholder"];

#[derive(Debug, Clone)]
pub struct ImageRule {
    audit_only: bool,
}

impl ImageRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let tree = &document.tree;
        let mut findings = Vec::new();

        for img in select(tree, "img")? {
            let src = tree.attr(img, "src").unwrap_or_default();
            let Some(alt) = tree.attr(img, "alt") else {
                findings.push(
                    Finding::suggestion(format!("Image without alt: {}", short_source(src)))
                        .with_fix("Add an alt attribute: a description, or alt=\"\" for a decorative image.")
                        .with_severity(Severity::Error)
                        .on(img),
                );
                continue;
            };
            let labelled = ["aria-labelledby", "aria-label", "title"]
                .iter()
                .any(|attr| tree.has_attr(img, attr));
            if !alt.trim().is_empty() && !labelled && looks_decorative(src) {
                findings.push(
                    Finding::suggestion("Decorative image with non-empty alt (use alt=\"\" or aria-hidden)")
                        .with_fix("Use alt=\"\" for images that carry no information.")
                        .on(img),
                );
            } else if self.audit_only {
                let shown = if alt.trim().is_empty() { short_source(src) } else { alt.to_string() };
                findings.push(
                    Finding::conformant(format!(
                        "Image with alt: {}",
                        truncate_for_display(&shown, DISPLAY_BUDGET)
                    ))
                    .on(img),
                );
            }
        }

        for input in select(tree, "input[type=image]")? {
            if !["alt", "aria-label", "aria-labelledby", "title"].iter().any(|a| has_value(tree, input, a)) {
                findings.push(error(input, "Image button without text alternative", "Add an alt attribute describing the button's action."));
            }
        }

        for area in select(tree, "area[href]")? {
            if !has_value(tree, area, "alt") && !has_value(tree, area, "aria-label") {
                findings.push(error(area, "Image map area without text alternative", "Add an alt attribute to the <area>."));
            }
        }

        for svg in select(tree, "svg[role=img]")? {
            if !svg_has_title(tree, svg)
                && !has_value(tree, svg, "aria-label")
                && !has_value(tree, svg, "aria-labelledby")
            {
                findings.push(error(svg, "SVG with role=\"img\" without text alternative", "Add a <title> or an aria-label to the SVG."));
            }
        }

        for canvas in select(tree, "canvas[role=img]")? {
            if !has_value(tree, canvas, "aria-label")
                && !has_value(tree, canvas, "aria-labelledby")
                && normalized_text(tree, canvas).is_empty()
            {
                findings.push(
                    Finding::suggestion("Canvas with role=\"img\" without text alternative")
                        .with_fix("Add an aria-label or fallback content inside the <canvas>.")
                        .on(canvas),
                );
            }
        }

        for embedded in select(tree, "object[type^=\"image/\"], embed[type^=\"image/\"]")? {
            if !["aria-label", "aria-labelledby", "title"].iter().any(|a| has_value(tree, embedded, a)) {
                let tag = tree.tag_name(embedded).unwrap_or("object");
                findings.push(
                    Finding::suggestion(format!("Image <{tag}> without text alternative"))
                        .with_fix("Add an aria-label or title describing the image.")
                        .on(embedded),
                );
            }
        }

        Ok(findings)
    }
}

fn error(node: NodeId, message: &str, fix: &str) -> Finding {
    Finding::suggestion(message)
        .with_fix(fix)
        .with_severity(Severity::Error)
        .on(node)
}

fn looks_decorative(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    DECORATIVE_SRC_HINTS.iter().any(|hint| lower.contains(hint))
}

fn svg_has_title(tree: &DomTree, svg: NodeId) -> bool {
    tree.element_children(svg)
        .filter(|&c| tree.is_tag(c, "title"))
        .any(|t| !normalized_text(tree, t).is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FindingKind;

    fn with_images(images: &[&[(&str, &str)]]) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let mut ids = Vec::new();
        for attrs in images {
            let img = doc.tree.create_element("img");
            for (name, value) in *attrs {
                doc.tree.set_attribute(img, name, value).unwrap();
            }
            doc.tree.append_child(body, img).unwrap();
            ids.push(img);
        }
        (doc, ids)
    }

    #[test]
    fn test_missing_alt_is_an_error() {
        let (mut doc, ids) = with_images(&[&[("src", "/media/hero.jpg?v=2")]]);
        let findings = ImageRule::new(false).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Image without alt: hero.jpg");
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].element, Some(ids[0]));
    }

    #[test]
    fn test_decorative_source_with_alt() {
        let (mut doc, _) = with_images(&[
            &[("src", "/assets/icons/arrow.svg"), ("alt", "arrow")],
            &[("src", "/assets/spacer.gif"), ("alt", "")],
        ]);
        let findings = ImageRule::new(false).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_audit_lists_conformant_images() {
        let (mut doc, _) = with_images(&[&[("src", "/a.png"), ("alt", "Team photo")]]);
        let findings = ImageRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings[0].kind, FindingKind::Conformant);
        assert!(ImageRule::new(false).run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_svg_title_counts() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let svg = doc.tree.create_element("svg");
        doc.tree.set_attribute(svg, "role", "img").unwrap();
        doc.tree.append_child(body, svg).unwrap();
        assert_eq!(ImageRule::new(true).run(&mut doc).unwrap().len(), 1);

        let title = doc.tree.create_element("title");
        let text = doc.tree.create_text("Chart");
        doc.tree.append_child(svg, title).unwrap();
        doc.tree.append_child(title, text).unwrap();
        assert!(ImageRule::new(true).run(&mut doc).unwrap().is_empty());
    }
}
