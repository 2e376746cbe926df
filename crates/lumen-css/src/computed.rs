//! Computed Styles
//!
//! The resolved values for an element after cascade. Only properties that
//! feed accessibility checks are tracked: visibility, colours, text size
//! and weight, and whether a focus indicator is drawn.

use crate::values::{parse_font_weight, parse_length, tokens};
use crate::{Color, Declaration};

/// Computed style for an element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    /// `display: none` on this element
    pub display_none: bool,
    /// `visibility: hidden | collapse` (inherited)
    pub visibility_hidden: bool,
    /// Text colour (inherited)
    pub color: Color,
    /// Own background colour (transparent unless set)
    pub background_color: Color,
    /// Font size in pixels (inherited)
    pub font_size_px: f32,
    /// Numeric font weight (inherited)
    pub font_weight: u16,
    outline_style_none: bool,
    outline_width_zero: bool,
    box_shadow: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            color: Color::BLACK,
            background_color: Color::TRANSPARENT,
            font_size_px: 16.0,
            font_weight: 400,
            outline_style_none: true,
            outline_width_zero: false,
            box_shadow: false,
        }
    }
}

/// Properties whose value passes from parent to child
const INHERITED: &[&str] = &["visibility", "color", "font-size", "font-weight"];

const OUTLINE_STYLES: &[&str] = &[
    "auto", "solid", "dotted", "dashed", "double", "groove", "ridge", "inset", "outset",
];

impl ComputedStyle {
    /// Initial values for a child of `parent`: inherited properties carry over
    pub fn inherit_from(parent: &ComputedStyle) -> Self {
        Self {
            visibility_hidden: parent.visibility_hidden,
            color: parent.color,
            font_size_px: parent.font_size_px,
            font_weight: parent.font_weight,
            ..Self::default()
        }
    }

    /// Whether an outline is drawn
    pub fn has_outline(&self) -> bool {
        !self.outline_style_none && !self.outline_width_zero
    }

    /// Whether a box shadow is drawn
    pub fn has_box_shadow(&self) -> bool {
        self.box_shadow
    }

    /// Any visible focus indicator
    pub fn has_focus_indicator(&self) -> bool {
        self.has_outline() || self.has_box_shadow()
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }

    /// Apply one cascaded declaration
    pub fn apply_declaration(&mut self, decl: &Declaration, parent: &ComputedStyle) {
        let value = decl.value.trim();
        let lower = value.to_ascii_lowercase();

        if lower == "inherit" {
            self.inherit_property(&decl.property, parent);
            return;
        }
        if lower == "initial" {
            self.reset_property(&decl.property);
            return;
        }
        if lower == "unset" || lower == "revert" {
            if INHERITED.contains(&decl.property.as_str()) {
                self.inherit_property(&decl.property, parent);
            } else {
                self.reset_property(&decl.property);
            }
            return;
        }

        match decl.property.as_str() {
            "display" => self.display_none = lower == "none",
            "visibility" => self.visibility_hidden = matches!(lower.as_str(), "hidden" | "collapse"),
            "color" => {
                if lower == "currentcolor" {
                    self.color = parent.color;
                } else if let Some(color) = Color::parse(value) {
                    self.color = color;
                }
            }
            "background-color" => {
                if lower == "currentcolor" {
                    self.background_color = self.color;
                } else if let Some(color) = Color::parse(value) {
                    self.background_color = color;
                }
            }
            "background" => {
                self.background_color = tokens(value)
                    .into_iter()
                    .rev()
                    .find_map(|t| {
                        if t.eq_ignore_ascii_case("currentcolor") {
                            Some(self.color)
                        } else {
                            Color::parse(t)
                        }
                    })
                    .unwrap_or(Color::TRANSPARENT);
            }
            "font-size" => {
                if let Some(px) = parse_length(value, parent.font_size_px) {
                    self.font_size_px = px;
                }
            }
            "font-weight" => {
                if let Some(weight) = parse_font_weight(value, parent.font_weight) {
                    self.font_weight = weight;
                }
            }
            "outline" => {
                let parts = tokens(&lower);
                self.outline_style_none = !parts.iter().any(|t| OUTLINE_STYLES.contains(t))
                    || parts.iter().any(|t| *t == "none");
                self.outline_width_zero = parts.iter().any(|t| is_zero_length(t));
            }
            "outline-style" => self.outline_style_none = lower == "none" || lower == "hidden",
            "outline-width" => self.outline_width_zero = is_zero_length(&lower),
            "box-shadow" => self.box_shadow = lower != "none",
            _ => {}
        }
    }

    fn inherit_property(&mut self, property: &str, parent: &ComputedStyle) {
        match property {
            "display" => self.display_none = parent.display_none,
            "visibility" => self.visibility_hidden = parent.visibility_hidden,
            "color" => self.color = parent.color,
            "background-color" | "background" => self.background_color = parent.background_color,
            "font-size" => self.font_size_px = parent.font_size_px,
            "font-weight" => self.font_weight = parent.font_weight,
            "outline" | "outline-style" | "outline-width" => {
                self.outline_style_none = parent.outline_style_none;
                self.outline_width_zero = parent.outline_width_zero;
            }
            "box-shadow" => self.box_shadow = parent.box_shadow,
            _ => {}
        }
    }

    fn reset_property(&mut self, property: &str) {
        let initial = Self::default();
        match property {
            "display" => self.display_none = initial.display_none,
            "visibility" => self.visibility_hidden = initial.visibility_hidden,
            "color" => self.color = initial.color,
            "font-size" => self.font_size_px = initial.font_size_px,
            "font-weight" => self.font_weight = initial.font_weight,
            "background-color" | "background" => self.background_color = initial.background_color,
            "outline" | "outline-style" | "outline-width" => {
                self.outline_style_none = initial.outline_style_none;
                self.outline_width_zero = initial.outline_width_zero;
            }
            "box-shadow" => self.box_shadow = initial.box_shadow,
            _ => {}
        }
    }
}

fn is_zero_length(token: &str) -> bool {
    let number = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    !number.is_empty() && number.parse::<f32>().is_ok_and(|n| n == 0.0)
}
