//! Comprehensive tests for lumen-a11y
//!
//! Full passes over parsed pages: idempotence, audit read-only behavior,
//! watching, serialization and configuration loading.

use lumen_a11y::{
    AuditConfig, Auditor, FindingKind, Grade, Mode, Report, ReportExporter, ReportRenderer, RuleKind,
    RuleToggles, Severity, SpeechController, SpeechState, score,
};
use lumen_dom::Document;
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const SHOP_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Mug shop</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
</head>
<body>
    <header><a href="/">Home</a></header>
    <nav><a href="/mugs">Mugs</a> <a href="/cups">Cups</a></nav>
    <main>
        <h1>Mugs</h1>
        <div class="product">
            <h2 class="product-title">Blue mug</h2>
            <img src="/img/blue-mug.jpg">
            <button>Add to cart</button>
            <a href="https://maker.example/blue" target="_blank">Maker page</a>
        </div>
        <form>
            <label>Email</label>
            <input type="email" id="email" required>
            <div class="has-error"><input type="text" name="promo"></div>
            <button type="submit"><svg viewBox="0 0 16 16"><path d="M0 0h16v16z"></path></svg></button>
        </form>
        <table>
            <tr><th>Size</th><th>Price</th></tr>
            <tr><td>Small</td><td>9</td></tr>
        </table>
        <table><tr><td>Layout cell</td></tr></table>
        <iframe src="https://video.example/embed/1"></iframe>
        <video src="/clip.mp4" controls></video>
        <p style="color: #999999; background: #ffffff">Free shipping over 40</p>
    </main>
    <footer><p>Mug shop 2026</p></footer>
</body>
</html>"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn quiet(config: AuditConfig) -> AuditConfig {
    AuditConfig {
        log_report: Some(false),
        ..config.with_watch(false)
    }
}

fn only(kinds: &[RuleKind]) -> AuditConfig {
    quiet(AuditConfig::default().with_rules(RuleToggles::only(kinds)))
}

#[test]
fn test_enhance_pass_is_idempotent() {
    init_tracing();
    let mut doc = lumen_html::parse(SHOP_PAGE);
    let mut auditor = Auditor::new(quiet(AuditConfig::default()), &mut doc);
    assert!(!auditor.report().enhancements.is_empty());
    assert!(auditor.report().failures.is_empty());

    let after_first = lumen_html::serialize(&doc);
    let second = auditor.run(&mut doc, true);
    assert!(
        second.enhancements.is_empty(),
        "Second pass re-applied: {:?}",
        second.enhancements.iter().map(|f| &f.message).collect::<Vec<_>>()
    );
    assert_eq!(lumen_html::serialize(&doc), after_first);

    let suggestions = auditor.report().suggestions.len();
    let third = auditor.run(&mut doc, true);
    assert_eq!(third.suggestions.len(), suggestions);
    assert_eq!(lumen_html::serialize(&doc), after_first);
}

#[test]
fn test_audit_mode_leaves_markup_untouched() {
    init_tracing();
    let mut doc = lumen_html::parse(SHOP_PAGE);
    let before = lumen_html::serialize(&doc);
    let auditor = Auditor::new(quiet(AuditConfig::audit()), &mut doc);
    let report = auditor.report();

    assert_eq!(report.mode, Mode::Audit);
    assert!(report.enhancements.is_empty());
    assert!(!report.suggestions.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(lumen_html::serialize(&doc), before);
    assert!(!doc.tree.is_read_only());
}

#[test]
fn test_score_stays_in_bounds() {
    for config in [AuditConfig::default(), AuditConfig::audit()] {
        let mut doc = lumen_html::parse(SHOP_PAGE);
        let auditor = Auditor::new(quiet(config), &mut doc);
        let report = auditor.report();
        assert!(report.score <= 100);
        assert_eq!(report.grade, Grade::from_score(report.score));
        assert_eq!(
            report.score_details.total,
            report.score_details.suggestions
                + if report.score_details.enhancements > 0 {
                    report.score_details.enhancements
                } else {
                    report.score_details.conformant
                }
        );
    }

    assert_eq!(score(0, 0, 0).0, 100);
    assert_eq!(score(3, 1, 0).0, 75);
    assert_eq!(score(0, 1, 3).0, 75);
    assert_eq!(score(0, 4, 0).0, 0);
    assert!(score(2, 3, 0).0 < score(2, 1, 0).0);
}

#[test]
fn test_missing_language_is_added_once() {
    let mut doc = lumen_html::parse("<html><head><title>t</title></head><body><p>Bonjour</p></body></html>");
    let config = only(&[RuleKind::Lang]).with_default_language("fr");
    let mut auditor = Auditor::new(config, &mut doc);

    let report = auditor.report();
    assert_eq!(report.enhancements.len(), 1);
    assert_eq!(report.enhancements[0].message, "lang=\"fr\" added to <html>");
    let html = doc.document_element().unwrap();
    assert_eq!(doc.tree.attr(html, "lang"), Some("fr"));

    assert!(auditor.run(&mut doc, true).enhancements.is_empty());
}

#[test]
fn test_new_tab_link() {
    let mut doc = lumen_html::parse(
        r#"<html lang="en"><body><a id="more" href="https://docs.example" target="_blank">Learn more</a></body></html>"#,
    );
    let auditor = Auditor::new(only(&[RuleKind::Links]), &mut doc);

    let link = doc.get_element_by_id("more").unwrap();
    assert_eq!(doc.tree.attr(link, "aria-label"), Some("Learn more (opens in a new tab)"));
    assert_eq!(doc.tree.attr(link, "rel"), Some("noopener noreferrer"));
    let report = auditor.report();
    assert_eq!(report.enhancements.len(), 1);
    assert_eq!(report.enhancements[0].message, "Link enhanced: Learn more");
    assert_eq!(report.enhancements[0].source, Some("External links"));
}

#[test]
fn test_heading_levels() {
    let mut doc = lumen_html::parse("<html><body><h1>Shop</h1><h3>Details</h3></body></html>");
    let auditor = Auditor::new(quiet(AuditConfig::audit().with_rules(RuleToggles::only(&[RuleKind::Headings]))), &mut doc);
    let skips: Vec<_> = auditor.report().from_source("Headings (audit)").collect();
    assert_eq!(skips.len(), 1);
    assert_eq!(skips[0].message, "Level skip: h1 followed by h3 (Details)");
    assert_eq!(skips[0].kind, FindingKind::Suggestion);

    let mut doc = lumen_html::parse("<html><body><h1>Shop</h1><h2>Mugs</h2><h3>Blue</h3><h2>Cups</h2></body></html>");
    let auditor = Auditor::new(quiet(AuditConfig::audit().with_rules(RuleToggles::only(&[RuleKind::Headings]))), &mut doc);
    assert!(auditor.report().suggestions.is_empty());
}

#[test]
fn test_low_contrast_text() {
    let mut doc = lumen_html::parse(
        r#"<html><body><p style="color: #999; background: #fff">Muted text</p><p>Plain text</p></body></html>"#,
    );
    let auditor = Auditor::new(quiet(AuditConfig::audit().with_rules(RuleToggles::only(&[RuleKind::Contrast]))), &mut doc);
    let report = auditor.report();
    assert_eq!(report.suggestions.len(), 1);
    assert_eq!(report.suggestions[0].message, "Insufficient contrast (2.8:1) : Muted text");
    assert_eq!(report.suggestions[0].severity, Severity::Warning);
}

#[test]
fn test_serializable_report() {
    let mut doc = lumen_html::parse(SHOP_PAGE);
    let auditor = Auditor::new(quiet(AuditConfig::audit()), &mut doc);
    let serializable = auditor.report_serializable(&doc);
    assert_eq!(serializable.suggestions.len(), auditor.report().suggestions.len());

    let json = serializable.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["mode"], "audit");
    assert!(value["score"].is_u64());
    assert!(value["scoreDetails"]["total"].is_u64());
    for finding in value["suggestions"].as_array().unwrap() {
        assert!(finding.get("severity").is_some());
        assert!(finding.get("selector").is_some(), "selector key must always be present");
        assert_eq!(finding["type"], "suggestion");
    }
}

#[test]
fn test_watching_reruns_on_new_content() {
    init_tracing();
    let mut doc = lumen_html::parse(r#"<html lang="en"><body><main><p>Intro</p></main></body></html>"#);
    let config = AuditConfig {
        log_report: Some(false),
        ..AuditConfig::default().with_rules(RuleToggles::only(&[RuleKind::Links]))
    };
    let mut auditor = Auditor::new(config, &mut doc);
    assert!(auditor.is_watching());
    assert!(auditor.report().is_empty());

    let body = doc.body().unwrap();
    doc.tree.set_attribute(body, "class", "loaded").unwrap();
    assert!(auditor.on_mutations(&mut doc).is_none());

    let link = doc.tree.create_element("a");
    doc.tree.set_attribute(link, "href", "https://partner.example").unwrap();
    doc.tree.set_attribute(link, "target", "_blank").unwrap();
    let text = doc.tree.create_text("Partner");
    doc.tree.append_child(link, text).unwrap();
    doc.tree.append_child(body, link).unwrap();

    let report = auditor.on_mutations(&mut doc).unwrap();
    assert_eq!(report.enhancements.len(), 1);
    assert_eq!(doc.tree.attr(link, "aria-label"), Some("Partner (opens in a new tab)"));
    assert!(auditor.on_mutations(&mut doc).is_none(), "Own fixes do not trigger another pass");

    auditor.destroy(&mut doc);
    auditor.destroy(&mut doc);
    assert!(!auditor.is_watching());
    assert_eq!(doc.tree.observer_count(), 0);
    assert_eq!(doc.tree.attr(link, "rel"), Some("noopener noreferrer"));
}

#[test]
fn test_failing_rules_do_not_stop_the_pass() {
    let mut doc = lumen_html::parse(
        r#"<html><body><h1>Shop</h1><a href="/x" target="_blank">Out</a></body></html>"#,
    );
    doc.tree.set_read_only(true);
    let auditor = Auditor::new(only(&[RuleKind::Lang, RuleKind::Links, RuleKind::Headings]), &mut doc);
    let report = auditor.report();

    let failed: Vec<&str> = report.failures.iter().map(|f| f.source.as_str()).collect();
    assert_eq!(failed, vec!["Language", "External links"]);
    assert!(report.enhancements.is_empty());
    let html = doc.document_element().unwrap();
    assert!(!doc.tree.has_attr(html, "lang"));
    assert!(doc.tree.is_read_only());
}

#[derive(Clone, Default)]
struct Screen {
    shown: Rc<RefCell<Vec<(usize, usize)>>>,
}

impl ReportRenderer for Screen {
    fn render(&mut self, report: &Report, _document: &Document) {
        self.shown
            .borrow_mut()
            .push((report.enhancements.len(), report.suggestions.len()));
    }
}

impl ReportExporter for Screen {
    fn export(&mut self, report: &Report, _document: &Document) {
        self.shown.borrow_mut().push((report.score as usize, 0));
    }
}

#[test]
fn test_renderer_and_exporter() {
    let mut doc = lumen_html::parse(SHOP_PAGE);
    let screen = Screen::default();
    let shown = Rc::clone(&screen.shown);
    let mut auditor = Auditor::builder(quiet(AuditConfig::default()))
        .renderer(screen)
        .build(&mut doc);

    assert_eq!(shown.borrow().len(), 1);
    let (enhanced, _) = shown.borrow()[0];
    assert_eq!(enhanced, auditor.report().enhancements.len());

    auditor.run(&mut doc, true);
    assert_eq!(shown.borrow().len(), 1, "Silent passes are not rendered");

    let mut exporter = Screen::default();
    exporter.export(auditor.report(), &doc);
    assert_eq!(exporter.shown.borrow()[0].0, auditor.report().score as usize);
}

#[derive(Default)]
struct FakeSpeech {
    state: SpeechState,
    spoken: Vec<String>,
    listeners: Vec<Box<dyn FnMut(SpeechState)>>,
}

impl FakeSpeech {
    fn transition(&mut self, state: SpeechState) {
        self.state = state;
        for listener in &mut self.listeners {
            listener(state);
        }
    }
}

impl SpeechController for FakeSpeech {
    fn start(&mut self, text: &str) {
        self.spoken.push(text.to_string());
        self.transition(SpeechState::Speaking);
    }
    fn pause(&mut self) {
        if self.state == SpeechState::Speaking {
            self.transition(SpeechState::Paused);
        }
    }
    fn resume(&mut self) {
        if self.state == SpeechState::Paused {
            self.transition(SpeechState::Speaking);
        }
    }
    fn stop(&mut self) {
        self.transition(SpeechState::Idle);
    }
    fn state(&self) -> SpeechState {
        self.state
    }
    fn on_state_change(&mut self, listener: Box<dyn FnMut(SpeechState)>) {
        self.listeners.push(listener);
    }
}

#[test]
fn test_speech_controller_reads_report() {
    let mut doc = lumen_html::parse(SHOP_PAGE);
    let auditor = Auditor::new(quiet(AuditConfig::audit()), &mut doc);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let mut speech = FakeSpeech::default();
    speech.on_state_change(Box::new(move |state| log.borrow_mut().push(state)));

    let summary = format!("Score {} out of 100", auditor.report().score);
    speech.start(&summary);
    speech.pause();
    speech.resume();
    speech.stop();

    assert_eq!(speech.spoken, vec![summary]);
    assert_eq!(
        *seen.borrow(),
        vec![SpeechState::Speaking, SpeechState::Paused, SpeechState::Speaking, SpeechState::Idle]
    );
}

#[test]
fn test_config_from_json_aliases() {
    let config = AuditConfig::from_json_str(
        r#"{
            "mode": "AUDIT",
            "enhancers": {"skipLinks": false, "videos": false},
            "defaultLang": "de",
            "watch": false,
            "injectFocusStyles": false
        }"#,
    )
    .unwrap();
    assert_eq!(config.mode, Mode::Audit);
    assert!(!config.enabled_rules.skip_link);
    assert!(!config.enabled_rules.media);
    assert!(config.enabled_rules.forms);
    assert_eq!(config.default_language(), "de");
    assert!(!config.watch_for_changes);
    assert!(!config.inject_global_focus_styles);

    assert!(AuditConfig::from_json_str("{not json").is_err());
}

#[test]
fn test_disabled_rules_do_not_run() {
    let mut doc = lumen_html::parse(SHOP_PAGE);
    let config = quiet(AuditConfig::audit().with_rules(RuleToggles::only(&[RuleKind::Frames])));
    let auditor = Auditor::new(config, &mut doc);
    assert_eq!(auditor.rules().len(), 1);
    let report = auditor.report();
    assert!(report.findings().all(|f| f.source == Some("Frames (audit)")));
    assert_eq!(report.suggestions.len(), 1);
}
