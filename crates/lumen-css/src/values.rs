//! CSS value parsing
//!
//! Declarations reach us as serialized text; these helpers turn the few
//! values the audit cares about (colours, lengths, weights) back into
//! numbers.

/// CSS color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent colours never count as a background
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a colour value. `currentcolor` is not a concrete colour and
    /// yields `None`; callers resolve it against the inherited colour.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let lower = value.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Self::TRANSPARENT);
        }
        if let Some(hex) = lower.strip_prefix('#') {
            return Self::from_hex(hex);
        }
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::from_rgb_args(args);
        }
        named_color(&lower)
    }

    /// Parse a hex color (RGB, RGBA, RRGGBB, RRGGBBAA), without the `#`
    pub fn from_hex(hex: &str) -> Option<Self> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Some(Self::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// `r, g, b[, a]` or `r g b[ / a]`
    fn from_rgb_args(args: &str) -> Option<Self> {
        let (channels, alpha) = match args.split_once('/') {
            Some((c, a)) => (c, Some(a)),
            None => (args, None),
        };
        let parts: Vec<&str> = channels
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        let (rgb, alpha) = match (parts.as_slice(), alpha) {
            ([r, g, b], a) => ([*r, *g, *b], a),
            ([r, g, b, a], None) => ([*r, *g, *b], Some(*a)),
            _ => return None,
        };

        let channel = |s: &str| -> Option<u8> {
            let v = match s.strip_suffix('%') {
                Some(pct) => pct.parse::<f32>().ok()? * 2.55,
                None => s.parse::<f32>().ok()?,
            };
            Some(v.round().clamp(0.0, 255.0) as u8)
        };
        let a = match alpha.map(str::trim) {
            None => 255,
            Some(a) => {
                let v = match a.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                    None => a.parse::<f32>().ok()?,
                };
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };
        Some(Self::rgba(channel(rgb[0])?, channel(rgb[1])?, channel(rgb[2])?, a))
    }

    /// Composite this colour over an opaque backdrop
    pub fn over(&self, backdrop: Color) -> Color {
        if self.a == 255 {
            return *self;
        }
        let alpha = self.a as f64 / 255.0;
        let mix = |fg: u8, bg: u8| (fg as f64 * alpha + bg as f64 * (1.0 - alpha)).round() as u8;
        Color::rgb(mix(self.r, backdrop.r), mix(self.g, backdrop.g), mix(self.b, backdrop.b))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "navy" => (0, 0, 128),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "teal" => (0, 128, 128),
        "aqua" | "cyan" => (0, 255, 255),
        "fuchsia" | "magenta" => (255, 0, 255),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "whitesmoke" => (245, 245, 245),
        "gainsboro" => (220, 220, 220),
        "dimgray" | "dimgrey" => (105, 105, 105),
        _ => return None,
    };
    Some(Color::rgb(r, g, b))
}

/// Split a value on top-level whitespace, keeping `fn(...)` groups whole
pub fn tokens(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    out.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(&value[s..]);
    }
    out
}

/// Length in CSS pixels. `em` and `%` resolve against `parent_px`,
/// `rem` against the 16px root size.
pub fn parse_length(value: &str, parent_px: f32) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    if value == "0" {
        return Some(0.0);
    }
    let keyword = match value.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "xxx-large" => Some(48.0),
        "smaller" => Some(parent_px / 1.2),
        "larger" => Some(parent_px * 1.2),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f32 = number.parse().ok()?;
    let px = match unit {
        "px" => number,
        "em" => number * parent_px,
        "rem" => number * 16.0,
        "%" => number * parent_px / 100.0,
        "pt" => number * 4.0 / 3.0,
        "" if number == 0.0 => 0.0,
        _ => return None,
    };
    Some(px)
}

/// Numeric font weight
pub fn parse_font_weight(value: &str, parent: u16) -> Option<u16> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some(if parent < 600 { 700 } else { 900 }),
        "lighter" => Some(if parent > 500 { 400 } else { 100 }),
        other => other.parse::<u16>().ok().filter(|w| (1..=1000).contains(w)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(Color::parse("#999"), Some(Color::rgb(0x99, 0x99, 0x99)));
        assert_eq!(Color::parse("#FFFFFF"), Some(Color::WHITE));
        assert_eq!(Color::parse("#0000"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse("#00000080").map(|c| c.a), Some(0x80));
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#ggg"), None);
    }

    #[test]
    fn test_rgb_syntaxes() {
        assert_eq!(Color::parse("rgb(255, 0, 0)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("rgba(0,0,0,0)"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse("rgb(0 128 0 / 50%)"), Some(Color::rgba(0, 128, 0, 128)));
        assert_eq!(Color::parse("rgb(300, 0, 0)"), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_named_and_keywords() {
        assert_eq!(Color::parse("White"), Some(Color::WHITE));
        assert!(Color::parse("transparent").unwrap().is_transparent());
        assert_eq!(Color::parse("currentcolor"), None);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(parse_length("18px", 16.0), Some(18.0));
        assert_eq!(parse_length("1.5em", 20.0), Some(30.0));
        assert_eq!(parse_length("2rem", 99.0), Some(32.0));
        assert_eq!(parse_length("150%", 16.0), Some(24.0));
        assert_eq!(parse_length("18pt", 16.0), Some(24.0));
        assert_eq!(parse_length("x-large", 16.0), Some(24.0));
        assert_eq!(parse_length("auto", 16.0), None);
    }

    #[test]
    fn test_tokens_keep_functions_whole() {
        assert_eq!(
            tokens("url(a b.png) rgb(1, 2, 3)  no-repeat"),
            vec!["url(a b.png)", "rgb(1, 2, 3)", "no-repeat"]
        );
    }

    #[test]
    fn test_font_weight() {
        assert_eq!(parse_font_weight("bold", 400), Some(700));
        assert_eq!(parse_font_weight("600", 400), Some(600));
        assert_eq!(parse_font_weight("bolder", 700), Some(900));
        assert_eq!(parse_font_weight("heavy", 400), None);
    }
}
