//! WCAG contrast

use crate::Color;

/// WCAG 2.x contrast checker
pub struct ContrastChecker;

impl ContrastChecker {
    /// Calculate relative luminance
    pub fn luminance(color: Color) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        }
        0.2126 * channel(color.r) + 0.7152 * channel(color.g) + 0.0722 * channel(color.b)
    }

    /// Contrast ratio between two colours, 1.0 to 21.0
    pub fn contrast_ratio(a: Color, b: Color) -> f64 {
        let (l1, l2) = (Self::luminance(a), Self::luminance(b));
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Large text: at least 24px, or at least 18.5px and bold
    pub fn is_large_text(font_size_px: f32, bold: bool) -> bool {
        font_size_px >= 24.0 || (font_size_px >= 18.5 && bold)
    }

    /// Minimum AA ratio for the given text size
    pub fn required_ratio(large_text: bool) -> f64 {
        if large_text { 3.0 } else { 4.5 }
    }

    /// Check if contrast meets WCAG AA (4.5:1 for normal text)
    pub fn meets_aa(ratio: f64, large_text: bool) -> bool {
        ratio >= Self::required_ratio(large_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_ratio() {
        let ratio = ContrastChecker::contrast_ratio(Color::WHITE, Color::BLACK);
        assert!((ratio - 21.0).abs() < 0.1);
        assert_eq!(ContrastChecker::contrast_ratio(Color::WHITE, Color::WHITE), 1.0);
    }

    #[test]
    fn test_grey_on_white_fails_normal_text() {
        let ratio = ContrastChecker::contrast_ratio(Color::rgb(0x99, 0x99, 0x99), Color::WHITE);
        assert!(ratio < 4.5 && ratio > 2.5, "ratio was {ratio}");
        assert!(!ContrastChecker::meets_aa(ratio, false));
        assert!(ContrastChecker::meets_aa(ratio.max(3.0), true));
    }

    #[test]
    fn test_large_text_thresholds() {
        assert!(ContrastChecker::is_large_text(24.0, false));
        assert!(ContrastChecker::is_large_text(18.5, true));
        assert!(!ContrastChecker::is_large_text(18.5, false));
        assert!(!ContrastChecker::is_large_text(16.0, true));
    }
}
