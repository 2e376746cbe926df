//! CSS Parser using lightningcss
//!
//! Parses stylesheets and `style` attributes, then flattens them into
//! selector text plus `property: value` string pairs.

use crate::{CssError, Declaration, Rule, Stylesheet};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, StyleAttribute, StyleSheet};
use lightningcss::traits::ToCss;
use lumen_dom::Selector;

/// CSS Parser
#[derive(Debug, Clone, Copy, Default)]
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    fn options<'i>() -> ParserOptions<'i> {
        ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        }
    }

    /// Parse a CSS stylesheet
    pub fn parse(&self, css: &str) -> Result<Stylesheet, CssError> {
        let stylesheet = StyleSheet::parse(css, Self::options())
            .map_err(|e| CssError::ParseError { message: e.to_string() })?;

        let mut result = Stylesheet::new();
        for rule in stylesheet.rules.0.iter() {
            match rule {
                CssRule::Style(style_rule) => {
                    let selector_text = match style_rule.selectors.to_css_string(PrinterOptions::default()) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::debug!("Skipping rule with unprintable selector: {}", err);
                            continue;
                        }
                    };
                    let selector = match Selector::parse(&selector_text) {
                        Ok(selector) => Some(selector),
                        Err(err) => {
                            tracing::debug!("Selector '{}' not matchable: {}", selector_text, err);
                            None
                        }
                    };
                    result.rules.push(Rule {
                        selector_text,
                        selector,
                        declarations: self.convert_declarations(&style_rule.declarations),
                    });
                }
                // Conditional and at-rules are not evaluated
                _ => {}
            }
        }

        tracing::debug!("Parsed stylesheet with {} style rules", result.rules.len());
        Ok(result)
    }

    /// Parse the contents of a `style` attribute
    pub fn parse_inline(&self, style: &str) -> Result<Vec<Declaration>, CssError> {
        let attribute = StyleAttribute::parse(style, Self::options())
            .map_err(|e| CssError::ParseError { message: e.to_string() })?;
        Ok(self.convert_declarations(&attribute.declarations))
    }

    fn convert_declarations(&self, block: &DeclarationBlock) -> Vec<Declaration> {
        let normal = block.declarations.iter().map(|p| (p, false));
        let important = block.important_declarations.iter().map(|p| (p, true));
        normal
            .chain(important)
            .filter_map(|(property, important)| self.convert_declaration(property, important))
            .collect()
    }

    fn convert_declaration(&self, property: &Property, important: bool) -> Option<Declaration> {
        let name = property.property_id().name().to_ascii_lowercase();
        match property.value_to_css_string(PrinterOptions::default()) {
            Ok(value) => Some(Declaration { property: name, value, important }),
            Err(err) => {
                tracing::debug!("Dropping declaration '{}': {}", name, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(decls: &'a [Declaration], property: &str) -> Option<&'a Declaration> {
        decls.iter().find(|d| d.property == property)
    }

    #[test]
    fn test_parse_rules() {
        let sheet = CssParser::new()
            .parse("p.note { color: #999; font-weight: bold } a:focus { outline: none !important }")
            .unwrap();
        assert_eq!(sheet.rules.len(), 2);
        assert!(sheet.rules[0].selector.is_some());

        let color = find(&sheet.rules[0].declarations, "color").unwrap();
        assert_eq!(crate::Color::parse(&color.value), Some(crate::Color::rgb(0x99, 0x99, 0x99)));

        let outline = find(&sheet.rules[1].declarations, "outline").unwrap();
        assert!(outline.important);
    }

    #[test]
    fn test_parse_inline() {
        let decls = CssParser::new().parse_inline("display: none; font-size: 20px").unwrap();
        assert_eq!(find(&decls, "display").map(|d| d.value.as_str()), Some("none"));
        assert_eq!(find(&decls, "font-size").map(|d| d.value.as_str()), Some("20px"));
    }

    #[test]
    fn test_unmatchable_selector_is_kept_without_matcher() {
        let sheet = CssParser::new().parse("p::first-line { color: red }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert!(sheet.rules[0].selector.is_none());
    }
}
