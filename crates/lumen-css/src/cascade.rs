//! Style Cascade & Resolver
//!
//! Computes styles for DOM elements by:
//! 1. Matching selectors against elements
//! 2. Sorting by importance, origin, specificity and source order
//! 3. Applying the winners on top of the inherited parent style

use crate::computed::ComputedStyle;
use crate::{CssParser, Declaration, Stylesheet};
use lumen_dom::{Document, DomTree, MatchState, NodeId, Specificity};

/// Browser defaults the audit relies on
const UA_STYLESHEET: &str = "
head, script, style, title, template, meta, link, base, noscript, datalist { display: none }
[hidden] { display: none }
h1 { font-size: 2em; font-weight: bold }
h2 { font-size: 1.5em; font-weight: bold }
h3 { font-size: 1.17em; font-weight: bold }
h4 { font-size: 1em; font-weight: bold }
h5 { font-size: 0.83em; font-weight: bold }
h6 { font-size: 0.67em; font-weight: bold }
th, strong, b { font-weight: bold }
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
    Inline,
}

/// Style resolver - computes styles for DOM elements
#[derive(Debug)]
pub struct StyleResolver {
    /// User agent stylesheet (browser defaults)
    ua_styles: Stylesheet,
    /// Author stylesheets (page CSS)
    author_styles: Vec<Stylesheet>,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self {
            ua_styles: Self::default_ua_styles(),
            author_styles: Vec::new(),
        }
    }

    fn default_ua_styles() -> Stylesheet {
        CssParser::new().parse(UA_STYLESHEET).unwrap_or_else(|err| {
            tracing::error!("User agent stylesheet failed to parse: {}", err);
            Stylesheet::new()
        })
    }

    /// Resolver with every `<style>` element of the document, in order
    pub fn from_document(document: &Document) -> Self {
        let mut resolver = Self::new();
        let tree = document.tree();
        let styles: Vec<NodeId> = tree
            .descendant_elements(NodeId::ROOT)
            .filter(|&n| tree.is_tag(n, "style"))
            .collect();
        for style in styles {
            let css = tree.text_content(style);
            match CssParser::new().parse(&css) {
                Ok(sheet) => resolver.add_stylesheet(sheet),
                Err(err) => tracing::warn!("Ignoring unparsable <style> {}: {}", style, err),
            }
        }
        resolver
    }

    /// Add an author stylesheet
    pub fn add_stylesheet(&mut self, stylesheet: Stylesheet) {
        self.author_styles.push(stylesheet);
    }

    /// Number of author stylesheets
    pub fn stylesheet_count(&self) -> usize {
        self.author_styles.len()
    }

    /// Compute the style of one element
    pub fn computed(&self, tree: &DomTree, node: NodeId, state: &MatchState) -> ComputedStyle {
        self.style_chain(tree, node, state)
            .pop()
            .unwrap_or_default()
    }

    /// Whether the element and all of its ancestors are displayed
    pub fn is_rendered(&self, tree: &DomTree, node: NodeId) -> bool {
        let chain = self.style_chain(tree, node, &MatchState::default());
        !chain.is_empty() && chain.iter().all(|s| !s.display_none)
    }

    /// Rendered and not `visibility: hidden`
    pub fn is_visible(&self, tree: &DomTree, node: NodeId) -> bool {
        let chain = self.style_chain(tree, node, &MatchState::default());
        match chain.last() {
            Some(own) => !own.visibility_hidden && chain.iter().all(|s| !s.display_none),
            None => false,
        }
    }

    /// Computed styles from the outermost element ancestor down to `node`
    pub fn style_chain(&self, tree: &DomTree, node: NodeId, state: &MatchState) -> Vec<ComputedStyle> {
        if tree.element(node).is_none() {
            return Vec::new();
        }
        let mut path: Vec<NodeId> = tree
            .ancestors(node)
            .filter(|&a| tree.element(a).is_some())
            .collect();
        path.reverse();
        path.push(node);

        let mut chain: Vec<ComputedStyle> = Vec::with_capacity(path.len());
        for id in path {
            let root_style = ComputedStyle::default();
            let parent = chain.last().unwrap_or(&root_style);
            let style = self.cascade(tree, id, parent, state);
            chain.push(style);
        }
        chain
    }

    fn cascade(&self, tree: &DomTree, node: NodeId, parent: &ComputedStyle, state: &MatchState) -> ComputedStyle {
        // (important, origin, specificity, order, declaration)
        let mut matched: Vec<(bool, Origin, Specificity, usize, &Declaration)> = Vec::new();
        let mut order = 0usize;

        let sheets = std::iter::once((Origin::UserAgent, &self.ua_styles))
            .chain(self.author_styles.iter().map(|s| (Origin::Author, s)));
        for (origin, sheet) in sheets {
            for rule in &sheet.rules {
                let Some(selector) = &rule.selector else {
                    order += rule.declarations.len();
                    continue;
                };
                let specificity = selector.match_specificity(tree, node, state);
                for decl in &rule.declarations {
                    order += 1;
                    if let Some(specificity) = specificity {
                        matched.push((decl.important, origin, specificity, order, decl));
                    }
                }
            }
        }

        let inline = tree
            .attr(node, "style")
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| match CssParser::new().parse_inline(s) {
                Ok(decls) => Some(decls),
                Err(err) => {
                    tracing::debug!("Ignoring unparsable style attribute on {}: {}", node, err);
                    None
                }
            })
            .unwrap_or_default();
        for decl in &inline {
            order += 1;
            matched.push((decl.important, Origin::Inline, Specificity::default(), order, decl));
        }

        matched.sort_by(|a, b| (a.0, a.1, a.2, a.3).cmp(&(b.0, b.1, b.2, b.3)));

        let mut style = ComputedStyle::inherit_from(parent);
        for (_, _, _, _, decl) in matched {
            style.apply_declaration(decl, parent);
        }
        style
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new()
    }
}
