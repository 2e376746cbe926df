//! Auditor configuration
//!
//! Everything here normalizes instead of failing: unknown modes fall back
//! to enhance, unknown rule keys are ignored and an empty language code
//! means the default. Only malformed JSON is an error.

use crate::A11yError;
use crate::rules::RuleKind;
use serde::{Deserialize, Deserializer, Serialize};

/// Pass mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Apply safe fixes and report them
    #[default]
    Enhance,
    /// Read-only evaluation
    Audit,
}

impl Mode {
    /// Lenient parse; anything but `audit` is enhance
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "audit" => Mode::Audit,
            "enhance" => Mode::Enhance,
            other => {
                tracing::warn!("Unknown mode '{}', falling back to enhance", other);
                Mode::Enhance
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Enhance => "enhance",
            Mode::Audit => "audit",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Mode::parse(&raw))
    }
}

/// Per-rule on/off switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleToggles {
    pub lang: bool,
    pub links: bool,
    #[serde(alias = "skipLinks")]
    pub skip_link: bool,
    pub buttons: bool,
    pub images: bool,
    pub headings: bool,
    pub forms: bool,
    pub landmarks: bool,
    #[serde(alias = "videos")]
    pub media: bool,
    pub icons: bool,
    pub frames: bool,
    pub tables: bool,
    pub document: bool,
    pub contrast: bool,
    pub focus: bool,
}

impl Default for RuleToggles {
    fn default() -> Self {
        Self::all(true)
    }
}

impl RuleToggles {
    /// Every rule set to `enabled`
    pub fn all(enabled: bool) -> Self {
        Self {
            lang: enabled,
            links: enabled,
            skip_link: enabled,
            buttons: enabled,
            images: enabled,
            headings: enabled,
            forms: enabled,
            landmarks: enabled,
            media: enabled,
            icons: enabled,
            frames: enabled,
            tables: enabled,
            document: enabled,
            contrast: enabled,
            focus: enabled,
        }
    }

    /// Only the given rules
    pub fn only(kinds: &[RuleKind]) -> Self {
        let mut toggles = Self::all(false);
        for &kind in kinds {
            toggles.set(kind, true);
        }
        toggles
    }

    fn slot(&mut self, kind: RuleKind) -> &mut bool {
        match kind {
            RuleKind::Lang => &mut self.lang,
            RuleKind::Links => &mut self.links,
            RuleKind::SkipLink => &mut self.skip_link,
            RuleKind::Buttons => &mut self.buttons,
            RuleKind::Images => &mut self.images,
            RuleKind::Headings => &mut self.headings,
            RuleKind::Forms => &mut self.forms,
            RuleKind::Landmarks => &mut self.landmarks,
            RuleKind::Media => &mut self.media,
            RuleKind::Icons => &mut self.icons,
            RuleKind::Frames => &mut self.frames,
            RuleKind::Tables => &mut self.tables,
            RuleKind::Document => &mut self.document,
            RuleKind::Contrast => &mut self.contrast,
            RuleKind::Focus => &mut self.focus,
        }
    }

    pub fn is_enabled(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::Lang => self.lang,
            RuleKind::Links => self.links,
            RuleKind::SkipLink => self.skip_link,
            RuleKind::Buttons => self.buttons,
            RuleKind::Images => self.images,
            RuleKind::Headings => self.headings,
            RuleKind::Forms => self.forms,
            RuleKind::Landmarks => self.landmarks,
            RuleKind::Media => self.media,
            RuleKind::Icons => self.icons,
            RuleKind::Frames => self.frames,
            RuleKind::Tables => self.tables,
            RuleKind::Document => self.document,
            RuleKind::Contrast => self.contrast,
            RuleKind::Focus => self.focus,
        }
    }

    pub fn set(&mut self, kind: RuleKind, enabled: bool) {
        *self.slot(kind) = enabled;
    }
}

/// Product-name selectors used when none are configured
pub const DEFAULT_PRODUCT_NAME_SELECTORS: &[&str] = &[
    ".product-name",
    ".product-title",
    ".product__name",
    ".product__title",
    "[data-product-name]",
    "h2",
    "h3",
    ".card-title",
    ".item-name",
];

const DEFAULT_LANGUAGE: &str = "en";

/// Auditor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    pub mode: Mode,
    #[serde(alias = "enhancers")]
    pub enabled_rules: RuleToggles,
    pub product_name_selectors: Vec<String>,
    #[serde(alias = "defaultLang")]
    pub default_language: String,
    #[serde(alias = "watch")]
    pub watch_for_changes: bool,
    #[serde(alias = "injectFocusStyles")]
    pub inject_global_focus_styles: bool,
    /// `None` until set explicitly; see [`AuditConfig::effective_log_report`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_report: Option<bool>,
    pub filter_audit_only_in_enhance: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Enhance,
            enabled_rules: RuleToggles::default(),
            product_name_selectors: Vec::new(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            watch_for_changes: true,
            inject_global_focus_styles: true,
            log_report: None,
            filter_audit_only_in_enhance: true,
        }
    }
}

impl AuditConfig {
    /// Default configuration in audit mode
    pub fn audit() -> Self {
        Self {
            mode: Mode::Audit,
            ..Self::default()
        }
    }

    /// Read a JSON configuration object
    pub fn from_json_str(json: &str) -> Result<Self, A11yError> {
        let config: AuditConfig = serde_json::from_str(json).map_err(A11yError::Config)?;
        tracing::debug!("Loaded configuration (mode: {})", config.mode);
        Ok(config)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_rules(mut self, rules: RuleToggles) -> Self {
        self.enabled_rules = rules;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch_for_changes = watch;
        self
    }

    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = language.to_string();
        self
    }

    pub fn is_audit(&self) -> bool {
        self.mode == Mode::Audit
    }

    /// Language code for documents without one
    pub fn default_language(&self) -> &str {
        match self.default_language.trim() {
            "" => DEFAULT_LANGUAGE,
            code => code,
        }
    }

    /// Configured product-name selectors, or the built-in list
    pub fn product_selectors(&self) -> Vec<String> {
        if self.product_name_selectors.is_empty() {
            DEFAULT_PRODUCT_NAME_SELECTORS.iter().map(|s| s.to_string()).collect()
        } else {
            self.product_name_selectors.clone()
        }
    }

    /// Logging defaults to on, unless a visual renderer takes over
    pub fn effective_log_report(&self, has_renderer: bool) -> bool {
        self.log_report.unwrap_or(!has_renderer)
    }
}
