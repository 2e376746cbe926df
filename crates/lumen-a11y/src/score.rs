//! Conformance score

use serde::{Deserialize, Serialize};

/// Counts behind a score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDetails {
    pub enhancements: usize,
    pub conformant: usize,
    pub suggestions: usize,
    /// Positive count plus suggestions
    pub total: usize,
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Grade::A,
            75..=89 => Grade::B,
            60..=74 => Grade::C,
            40..=59 => Grade::D,
            20..=39 => Grade::E,
            _ => Grade::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score a pass from its bucket sizes.
///
/// Enhance runs count enhancements as the positive side and audit runs
/// count conformant items; the two are never added together.
pub fn score(enhancements: usize, suggestions: usize, conformant: usize) -> (u8, ScoreDetails) {
    let positive = if enhancements > 0 { enhancements } else { conformant };
    let total = positive + suggestions;
    let value = if total == 0 {
        100.0
    } else {
        (100.0 * positive as f64 / total as f64).round()
    };
    let details = ScoreDetails {
        enhancements,
        conformant,
        suggestions,
        total,
    };
    (value.clamp(0.0, 100.0) as u8, details)
}

/// One-line reading of a score
pub fn grade_explanation(score: u8) -> &'static str {
    match Grade::from_score(score) {
        Grade::A => "Excellent: almost every check passes.",
        Grade::B => "Good: a few issues remain to be fixed.",
        Grade::C => "Fair: several issues need attention.",
        Grade::D => "Poor: many checks fail.",
        Grade::E => "Very poor: most checks fail.",
        Grade::F => "Critical: the page is largely inaccessible.",
    }
}
