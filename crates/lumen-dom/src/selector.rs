//! Selector matching
//!
//! querySelector, closest and matches over the arena tree. Supports
//! selector lists, compound selectors (type, universal, id, class and
//! attribute tests), descendant and child combinators, `:not()`,
//! `:first-child` and the dynamic user-action pseudo-classes, which only
//! match through an explicit [`MatchState`].

use crate::{DomTree, NodeId};
use thiserror::Error;

/// Selector parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unsupported selector feature: {0}")]
    Unsupported(String),
    #[error("unexpected end of selector")]
    UnexpectedEnd,
}

/// Dynamic state consulted by `:focus`, `:hover` and friends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchState {
    pub focused: Option<NodeId>,
    pub hovered: Option<NodeId>,
    pub active: Option<NodeId>,
}

impl MatchState {
    /// State with `node` focused (keyboard focus, so `:focus-visible` applies)
    pub fn focused(node: NodeId) -> Self {
        Self {
            focused: Some(node),
            ..Default::default()
        }
    }
}

/// CSS specificity `(ids, classes, types)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Self) -> Self {
        Specificity(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// Parsed selector list
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone)]
struct Complex {
    /// Compounds left to right
    parts: Vec<Compound>,
    /// `combinators[i]` joins `parts[i]` and `parts[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudos: Vec<Pseudo>,
    negations: Vec<Compound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    Focus,
    FocusVisible,
    FocusWithin,
    Hover,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
    case_insensitive: bool,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser { chars: input.char_indices().collect(), pos: 0 };
        let mut alternatives = Vec::new();
        loop {
            parser.skip_ws();
            alternatives.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                Some(',') => parser.pos += 1,
                None => break,
                Some(c) => {
                    return Err(SelectorError::Unexpected { found: c, offset: parser.offset() });
                }
            }
        }
        Ok(Self {
            source: input.trim().to_string(),
            alternatives,
        })
    }

    /// Source text as given
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether any alternative matches `node`
    pub fn matches(&self, tree: &DomTree, node: NodeId, state: &MatchState) -> bool {
        self.alternatives.iter().any(|c| c.matches(tree, node, state))
    }

    /// Highest specificity among the alternatives matching `node`
    pub fn match_specificity(
        &self,
        tree: &DomTree,
        node: NodeId,
        state: &MatchState,
    ) -> Option<Specificity> {
        self.alternatives
            .iter()
            .filter(|c| c.matches(tree, node, state))
            .map(Complex::specificity)
            .max()
    }

    /// Whether the selector depends on dynamic state
    pub fn is_dynamic(&self) -> bool {
        self.alternatives
            .iter()
            .flat_map(|c| c.parts.iter())
            .any(Compound::is_dynamic)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl Complex {
    fn matches(&self, tree: &DomTree, node: NodeId, state: &MatchState) -> bool {
        if self.parts.is_empty() {
            return false;
        }
        self.matches_from(tree, node, state, self.parts.len() - 1)
    }

    fn matches_from(&self, tree: &DomTree, node: NodeId, state: &MatchState, index: usize) -> bool {
        if !self.parts[index].matches(tree, node, state) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree
                .parent_element(node)
                .is_some_and(|p| self.matches_from(tree, p, state, index - 1)),
            Combinator::Descendant => tree
                .ancestors(node)
                .filter(|&a| tree.element(a).is_some())
                .any(|a| self.matches_from(tree, a, state, index - 1)),
        }
    }

    fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .map(Compound::specificity)
            .fold(Specificity::default(), |acc, s| acc + s)
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
            && self.negations.is_empty()
    }

    fn is_dynamic(&self) -> bool {
        self.pseudos.iter().any(|p| *p != Pseudo::FirstChild)
            || self.negations.iter().any(Compound::is_dynamic)
    }

    fn specificity(&self) -> Specificity {
        let own = Specificity(
            self.ids.len() as u32,
            (self.classes.len() + self.attrs.len() + self.pseudos.len()) as u32,
            u32::from(self.tag.as_deref().is_some_and(|t| t != "*")),
        );
        self.negations.iter().fold(own, |acc, n| acc + n.specificity())
    }

    fn matches(&self, tree: &DomTree, node: NodeId, state: &MatchState) -> bool {
        let Some(elem) = tree.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != elem.name {
                return false;
            }
        }
        if !self.ids.iter().all(|id| elem.get_attr("id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| elem.has_class(c)) {
            return false;
        }
        if !self.attrs.iter().all(|a| a.matches(elem.get_attr(&a.name))) {
            return false;
        }
        if !self.pseudos.iter().all(|p| p.matches(tree, node, state)) {
            return false;
        }
        !self.negations.iter().any(|n| n.matches(tree, node, state))
    }
}

impl Pseudo {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "first-child" => Self::FirstChild,
            "focus" => Self::Focus,
            "focus-visible" => Self::FocusVisible,
            "focus-within" => Self::FocusWithin,
            "hover" => Self::Hover,
            "active" => Self::Active,
            _ => return None,
        })
    }

    fn matches(self, tree: &DomTree, node: NodeId, state: &MatchState) -> bool {
        match self {
            Self::FirstChild => {
                tree.parent(node).is_some() && tree.previous_element_sibling(node).is_none()
            }
            Self::Focus | Self::FocusVisible => state.focused == Some(node),
            Self::FocusWithin => state.focused.is_some_and(|f| tree.contains(node, f)),
            Self::Hover => state.hovered.is_some_and(|h| tree.contains(node, h)),
            Self::Active => state.active.is_some_and(|a| tree.contains(node, a)),
        }
    }
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let (actual, expected) = if self.case_insensitive {
            (actual.to_lowercase(), self.value.to_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_ascii_whitespace().any(|t| t == expected),
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{expected}-"))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(usize::MAX, |&(o, _)| o)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(SelectorError::Unexpected { found: c, offset: self.offset() }),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some('+') | Some('~') => {
                    return Err(SelectorError::Unsupported("sibling combinator".into()));
                }
                Some(',') | None | Some(')') => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => {
                    return Err(SelectorError::Unexpected { found: c, offset: self.offset() });
                }
            };
            combinators.push(combinator);
            parts.push(self.compound()?);
        }
        Ok(Complex { parts, combinators })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                compound.tag = Some("*".into());
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    if self.peek() == Some(':') {
                        return Err(SelectorError::Unsupported("pseudo-element".into()));
                    }
                    let name = self.ident()?;
                    if name.eq_ignore_ascii_case("not") {
                        self.expect('(')?;
                        self.skip_ws();
                        let inner = self.compound()?;
                        self.skip_ws();
                        self.expect(')')?;
                        compound.negations.push(inner);
                    } else {
                        let pseudo = Pseudo::from_name(&name)
                            .ok_or_else(|| SelectorError::Unsupported(format!(":{name}")))?;
                        compound.pseudos.push(pseudo);
                    }
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            return match self.peek() {
                Some(c) => Err(SelectorError::Unexpected { found: c, offset: self.offset() }),
                None if self.pos == 0 => Err(SelectorError::Empty),
                None => Err(SelectorError::UnexpectedEnd),
            };
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                    case_insensitive: false,
                });
            }
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('|') => AttrOp::DashMatch,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            Some(c) => return Err(SelectorError::Unexpected { found: c, offset: self.offset() }),
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.pos += 1;
        if op != AttrOp::Equals {
            self.expect('=')?;
        }
        self.skip_ws();

        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => self.quoted(q)?,
            Some(_) => self.ident()?,
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_ws();
        let mut case_insensitive = false;
        if matches!(self.peek(), Some('i') | Some('I')) {
            self.pos += 1;
            case_insensitive = true;
            self.skip_ws();
        } else if matches!(self.peek(), Some('s') | Some('S')) {
            self.pos += 1;
            self.skip_ws();
        }
        self.expect(']')?;
        Ok(AttrSelector { name, op, value, case_insensitive })
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(SelectorError::UnexpectedEnd),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(c) = self.peek() {
                        out.push(c);
                        self.pos += 1;
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                match self.peek() {
                    Some(escaped) => {
                        out.push(escaped);
                        self.pos += 1;
                    }
                    None => return Err(SelectorError::UnexpectedEnd),
                }
            } else if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            return match self.peek() {
                Some(c) => Err(SelectorError::Unexpected { found: c, offset: self.offset() }),
                None => Err(SelectorError::UnexpectedEnd),
            };
        }
        Ok(out)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

// ---- tree queries ----

impl DomTree {
    /// Whether `node` matches `selector` (no dynamic state)
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node, &MatchState::default())
    }

    /// First element under `root` matching the selector
    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendant_elements(root).find(|&n| self.matches(n, selector))
    }

    /// All elements under `root` matching the selector, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendant_elements(root)
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    /// Parse and run a selector in one go
    pub fn select(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_selector_all(root, &selector))
    }

    /// Nearest inclusive ancestor matching the selector
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .filter(|&n| self.element(n).is_some())
            .find(|&n| self.matches(n, selector))
    }
}
