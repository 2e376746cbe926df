//! Lumen CSS
//!
//! Stylesheet parsing (lightningcss), value parsing and the cascade that
//! produces the handful of computed properties accessibility checks read.

mod parser;
mod values;
mod contrast;
mod computed;
mod cascade;

pub use parser::CssParser;
pub use values::{Color, parse_font_weight, parse_length, tokens};
pub use contrast::ContrastChecker;
pub use computed::ComputedStyle;
pub use cascade::StyleResolver;

use lumen_dom::Selector;

/// Parse a CSS stylesheet
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, CssError> {
    CssParser::new().parse(css)
}

/// Parsed stylesheet
#[derive(Debug, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }
}

/// CSS style rule
#[derive(Debug)]
pub struct Rule {
    /// Selector text as serialized by the parser
    pub selector_text: String,
    /// Matchable selector; `None` when it uses features we cannot match
    pub selector: Option<Selector>,
    pub declarations: Vec<Declaration>,
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// CSS parsing error
#[derive(Debug, thiserror::Error)]
pub enum CssError {
    #[error("Parse error: {message}")]
    ParseError { message: String },
}
