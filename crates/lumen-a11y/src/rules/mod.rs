//! Accessibility rules
//!
//! Each rule is one self-contained detector and fixer. Rules are built once
//! by the auditor with an `audit_only` flag; in audit mode they only read
//! the document and report suggestions or conformant items, otherwise they
//! apply safe fixes and report enhancements.
//!
//! Every rule checks whether a fix is already in place before mutating, so
//! a second pass over an unchanged document changes nothing.

mod lang;
mod links;
mod skip_link;
mod buttons;
mod images;
mod headings;
mod forms;
mod landmarks;
mod media;
mod icons;
mod frames;
mod tables;
mod document;
mod contrast;
mod focus;

pub use lang::LangRule;
pub use links::{LinkRule, NEW_TAB_SUFFIX};
pub use skip_link::{SKIP_LINK_ID, SkipLinkRule};
pub use buttons::ButtonRule;
pub use images::ImageRule;
pub use headings::HeadingRule;
pub use forms::FormRule;
pub use landmarks::LandmarkRule;
pub use media::MediaRule;
pub use icons::IconRule;
pub use frames::FrameRule;
pub use tables::TableRule;
pub use document::DocumentRule;
pub use contrast::ContrastRule;
pub use focus::{FOCUS_STYLE_ID, FocusRule};

use crate::{AuditConfig, Finding, RuleResult};
use lumen_dom::{Document, DomTree, NodeId};

/// Identity of a rule, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    Lang,
    Links,
    SkipLink,
    Buttons,
    Images,
    Headings,
    Forms,
    Landmarks,
    Media,
    Icons,
    Frames,
    Tables,
    Document,
    Contrast,
    Focus,
}

impl RuleKind {
    /// Every rule in registry order
    pub const ALL: [RuleKind; 15] = [
        RuleKind::Lang,
        RuleKind::Links,
        RuleKind::SkipLink,
        RuleKind::Buttons,
        RuleKind::Images,
        RuleKind::Headings,
        RuleKind::Forms,
        RuleKind::Landmarks,
        RuleKind::Media,
        RuleKind::Icons,
        RuleKind::Frames,
        RuleKind::Tables,
        RuleKind::Document,
        RuleKind::Contrast,
        RuleKind::Focus,
    ];

    /// Category label stamped on findings as their `source`
    pub fn label(self) -> &'static str {
        match self {
            RuleKind::Lang => "Language",
            RuleKind::Links => "External links",
            RuleKind::SkipLink => "Skip link",
            RuleKind::Buttons => "Product buttons",
            RuleKind::Images => "Images (audit)",
            RuleKind::Headings => "Headings (audit)",
            RuleKind::Forms => "Forms",
            RuleKind::Landmarks => "Landmarks",
            RuleKind::Media => "Media (audit)",
            RuleKind::Icons => "Decorative icons",
            RuleKind::Frames => "Frames (audit)",
            RuleKind::Tables => "Tables (audit)",
            RuleKind::Document => "Document (audit)",
            RuleKind::Contrast => "Contrast (audit)",
            RuleKind::Focus => "Focus (audit)",
        }
    }

    /// Categories whose suggestions are hidden from enhance-mode displays
    pub fn is_audit_only_category(self) -> bool {
        matches!(
            self,
            RuleKind::Images
                | RuleKind::Headings
                | RuleKind::Media
                | RuleKind::Frames
                | RuleKind::Tables
                | RuleKind::Document
                | RuleKind::Contrast
                | RuleKind::Focus
        )
    }

    /// Kind whose label is `source`
    pub fn from_label(source: &str) -> Option<RuleKind> {
        RuleKind::ALL.into_iter().find(|k| k.label() == source)
    }
}

/// Whether findings from `source` belong to an audit-only category
pub fn is_audit_only_source(source: &str) -> bool {
    RuleKind::from_label(source).is_some_and(RuleKind::is_audit_only_category)
}

/// One registered rule
#[derive(Debug, Clone)]
pub enum Rule {
    Lang(LangRule),
    Links(LinkRule),
    SkipLink(SkipLinkRule),
    Buttons(ButtonRule),
    Images(ImageRule),
    Headings(HeadingRule),
    Forms(FormRule),
    Landmarks(LandmarkRule),
    Media(MediaRule),
    Icons(IconRule),
    Frames(FrameRule),
    Tables(TableRule),
    Document(DocumentRule),
    Contrast(ContrastRule),
    Focus(FocusRule),
}

impl Rule {
    /// Build one rule from the configuration
    pub fn new(kind: RuleKind, config: &AuditConfig) -> Self {
        let audit_only = config.is_audit();
        match kind {
            RuleKind::Lang => Rule::Lang(LangRule::new(audit_only, config.default_language())),
            RuleKind::Links => Rule::Links(LinkRule::new(audit_only)),
            RuleKind::SkipLink => Rule::SkipLink(SkipLinkRule::new(audit_only)),
            RuleKind::Buttons => {
                Rule::Buttons(ButtonRule::new(audit_only, config.product_selectors()))
            }
            RuleKind::Images => Rule::Images(ImageRule::new(audit_only)),
            RuleKind::Headings => Rule::Headings(HeadingRule::new(audit_only)),
            RuleKind::Forms => Rule::Forms(FormRule::new(audit_only)),
            RuleKind::Landmarks => Rule::Landmarks(LandmarkRule::new(audit_only)),
            RuleKind::Media => Rule::Media(MediaRule::new(audit_only)),
            RuleKind::Icons => Rule::Icons(IconRule::new(audit_only)),
            RuleKind::Frames => Rule::Frames(FrameRule::new(audit_only)),
            RuleKind::Tables => Rule::Tables(TableRule::new(audit_only)),
            RuleKind::Document => Rule::Document(DocumentRule::new(audit_only)),
            RuleKind::Contrast => Rule::Contrast(ContrastRule::new(audit_only)),
            RuleKind::Focus => {
                Rule::Focus(FocusRule::new(audit_only, config.inject_global_focus_styles))
            }
        }
    }

    /// Enabled rules in registry order
    pub fn create_all(config: &AuditConfig) -> Vec<Rule> {
        RuleKind::ALL
            .into_iter()
            .filter(|&kind| config.enabled_rules.is_enabled(kind))
            .map(|kind| Rule::new(kind, config))
            .collect()
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Lang(_) => RuleKind::Lang,
            Rule::Links(_) => RuleKind::Links,
            Rule::SkipLink(_) => RuleKind::SkipLink,
            Rule::Buttons(_) => RuleKind::Buttons,
            Rule::Images(_) => RuleKind::Images,
            Rule::Headings(_) => RuleKind::Headings,
            Rule::Forms(_) => RuleKind::Forms,
            Rule::Landmarks(_) => RuleKind::Landmarks,
            Rule::Media(_) => RuleKind::Media,
            Rule::Icons(_) => RuleKind::Icons,
            Rule::Frames(_) => RuleKind::Frames,
            Rule::Tables(_) => RuleKind::Tables,
            Rule::Document(_) => RuleKind::Document,
            Rule::Contrast(_) => RuleKind::Contrast,
            Rule::Focus(_) => RuleKind::Focus,
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind().label()
    }

    /// Run the rule once over the document
    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        match self {
            Rule::Lang(rule) => rule.run(document),
            Rule::Links(rule) => rule.run(document),
            Rule::SkipLink(rule) => rule.run(document),
            Rule::Buttons(rule) => rule.run(document),
            Rule::Images(rule) => rule.run(document),
            Rule::Headings(rule) => rule.run(document),
            Rule::Forms(rule) => rule.run(document),
            Rule::Landmarks(rule) => rule.run(document),
            Rule::Media(rule) => rule.run(document),
            Rule::Icons(rule) => rule.run(document),
            Rule::Frames(rule) => rule.run(document),
            Rule::Tables(rule) => rule.run(document),
            Rule::Document(rule) => rule.run(document),
            Rule::Contrast(rule) => rule.run(document),
            Rule::Focus(rule) => rule.run(document),
        }
    }
}

// ---- helpers shared by the rules ----

/// All elements of the document matching `selector`, in document order
pub(crate) fn select(tree: &DomTree, selector: &str) -> RuleResult<Vec<NodeId>> {
    Ok(tree.select(NodeId::ROOT, selector)?)
}

/// Text content with whitespace collapsed
pub(crate) fn normalized_text(tree: &DomTree, node: NodeId) -> String {
    tree.text_content(node).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether the attribute is present with a non-blank value
pub(crate) fn has_value(tree: &DomTree, node: NodeId, name: &str) -> bool {
    tree.attr_trimmed(node, name).is_some()
}

/// Last path segment of a URL with the query string removed
pub(crate) fn short_source(src: &str) -> String {
    let last = src.rsplit('/').next().unwrap_or(src);
    let short = last.split(['?', '#']).next().unwrap_or(last);
    if short.is_empty() { src.to_string() } else { short.to_string() }
}

/// Name shown for a form control: name, placeholder, id, or "Field"
pub(crate) fn field_name(tree: &DomTree, node: NodeId) -> String {
    ["name", "placeholder", "id"]
        .iter()
        .find_map(|attr| tree.attr_trimmed(node, attr))
        .unwrap_or("Field")
        .to_string()
}
