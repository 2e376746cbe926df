//! Auditor - rule orchestration
//!
//! One pass runs every enabled rule in registry order over the document,
//! normalizes and buckets what they return, scores it and keeps the result
//! as the current [`Report`]. Each rule runs inside a tree checkpoint: a
//! rule that errors or panics has its partial changes rolled back and is
//! listed in [`Report::failures`], and the pass carries on.

use crate::rules::{Rule, is_audit_only_source};
use crate::{
    A11yError, AuditConfig, ChangeWatcher, Finding, Mode, Report, ReportRenderer, RuleFailure,
    SerializableReport, Severity,
};
use lumen_dom::Document;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Called after every pass, silent ones included
pub type ReportCallback = Box<dyn FnMut(&Report, &AuditorHandle<'_>)>;

/// Read access to the auditor from inside a report callback
pub struct AuditorHandle<'a> {
    auditor: &'a Auditor,
    document: &'a Document,
}

impl AuditorHandle<'_> {
    pub fn mode(&self) -> Mode {
        self.auditor.mode()
    }

    pub fn is_watching(&self) -> bool {
        self.auditor.is_watching()
    }

    pub fn report(&self) -> &Report {
        self.auditor.report()
    }

    pub fn report_serializable(&self) -> SerializableReport {
        self.auditor.report_serializable(self.document)
    }
}

/// Builder for [`Auditor`]
pub struct AuditorBuilder {
    config: AuditConfig,
    on_report: Option<ReportCallback>,
    renderer: Option<Box<dyn ReportRenderer>>,
}

impl AuditorBuilder {
    pub fn on_report(mut self, callback: impl FnMut(&Report, &AuditorHandle<'_>) + 'static) -> Self {
        self.on_report = Some(Box::new(callback));
        self
    }

    pub fn renderer(mut self, renderer: impl ReportRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Create the rules, run the first visible pass and start watching
    /// when configured.
    pub fn build(self, document: &mut Document) -> Auditor {
        let log_report = self.config.effective_log_report(self.renderer.is_some());
        let rules = Rule::create_all(&self.config);
        tracing::info!(
            mode = %self.config.mode,
            "Accessibility auditor ready with {} rule(s)",
            rules.len()
        );

        let mut auditor = Auditor {
            last_report: Report::empty(self.config.mode),
            config: self.config,
            rules,
            watcher: ChangeWatcher::new(),
            on_report: self.on_report,
            renderer: self.renderer,
            log_report,
            passes: 0,
        };
        auditor.run(document, false);
        if auditor.config.watch_for_changes {
            auditor.watcher.start(document);
        }
        auditor
    }
}

/// Runs the rules and owns the latest report
pub struct Auditor {
    config: AuditConfig,
    rules: Vec<Rule>,
    last_report: Report,
    watcher: ChangeWatcher,
    on_report: Option<ReportCallback>,
    renderer: Option<Box<dyn ReportRenderer>>,
    log_report: bool,
    passes: u64,
}

impl Auditor {
    pub fn builder(config: AuditConfig) -> AuditorBuilder {
        AuditorBuilder {
            config,
            on_report: None,
            renderer: None,
        }
    }

    /// Auditor without callback or renderer; runs the first pass
    pub fn new(config: AuditConfig, document: &mut Document) -> Self {
        Self::builder(config).build(document)
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run every rule once.
    ///
    /// A silent pass skips the renderer and the log; the report callback
    /// still fires.
    pub fn run(&mut self, document: &mut Document, silent: bool) -> &Report {
        let was_read_only = document.tree.is_read_only();
        if self.config.is_audit() {
            document.tree.set_read_only(true);
        }

        let mut findings = Vec::new();
        let mut failures = Vec::new();
        for rule in &self.rules {
            let source = rule.label();
            match run_isolated(rule, document) {
                Ok(items) => {
                    let tree = &document.tree;
                    findings.extend(items.into_iter().map(|f| f.normalize(tree, source)));
                }
                Err(failure) => {
                    tracing::warn!("{}", failure);
                    if let A11yError::RuleFailure { message, .. } = failure {
                        failures.push(RuleFailure {
                            source: source.to_string(),
                            message,
                        });
                    }
                }
            }
        }
        document.tree.set_read_only(was_read_only);

        self.last_report = Report::build(findings, self.config.mode, failures);
        self.passes += 1;
        tracing::debug!(
            silent,
            pass = self.passes,
            "Pass complete: score {} ({})",
            self.last_report.score,
            self.last_report.grade
        );

        if let Some(mut callback) = self.on_report.take() {
            let handle = AuditorHandle {
                auditor: self,
                document: &*document,
            };
            callback(&self.last_report, &handle);
            self.on_report = Some(callback);
        }

        if !silent && !self.last_report.is_empty() {
            let shown = self.display_report();
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.render(&shown, document);
            }
            if self.log_report {
                log_report(&shown);
            }
        }

        // Our own fixes must not trigger another pass
        self.watcher.discard_pending(&mut document.tree);
        &self.last_report
    }

    /// Latest report, with live node references
    pub fn report(&self) -> &Report {
        &self.last_report
    }

    /// Latest report with node references replaced by selectors
    pub fn report_serializable(&self, document: &Document) -> SerializableReport {
        self.last_report.to_serializable(&document.tree)
    }

    /// Handle one batch of mutations delivered by the host.
    ///
    /// Returns the new report when the batch added or removed nodes.
    pub fn on_mutations(&mut self, document: &mut Document) -> Option<&Report> {
        let batch = self.watcher.take_batch(&mut document.tree)?;
        if !ChangeWatcher::is_relevant(&batch) {
            return None;
        }
        tracing::debug!("{} mutation record(s), re-running silently", batch.len());
        Some(self.run(document, true))
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_watching()
    }

    /// Stop watching. Applied fixes stay in place; safe to call twice.
    pub fn destroy(&mut self, document: &mut Document) {
        if self.watcher.stop(&mut document.tree) {
            tracing::info!("Accessibility auditor stopped watching");
        }
    }

    /// What the renderer and the log see: in enhance mode, suggestions
    /// from audit-only categories are left out.
    fn display_report(&self) -> Report {
        if self.config.is_audit() || !self.config.filter_audit_only_in_enhance {
            return self.last_report.clone();
        }
        self.last_report
            .retain_suggestions(|f| !f.source.is_some_and(is_audit_only_source))
    }
}

impl fmt::Debug for Auditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auditor")
            .field("mode", &self.config.mode)
            .field("rules", &self.rules.len())
            .field("watching", &self.is_watching())
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

/// Run one rule inside a checkpoint, undoing its changes if it fails
fn run_isolated(rule: &Rule, document: &mut Document) -> Result<Vec<Finding>, A11yError> {
    document.tree.checkpoint();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.run(document)));
    let message = match outcome {
        Ok(Ok(findings)) => {
            document.tree.commit();
            return Ok(findings);
        }
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    let undone = document.tree.rollback();
    if undone > 0 {
        tracing::debug!("Undid {} change(s) from {}", undone, rule.label());
    }
    Err(A11yError::RuleFailure {
        rule: rule.label().to_string(),
        message,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("panicked: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("panicked: {text}")
    } else {
        "panicked".to_string()
    }
}

fn log_report(report: &Report) {
    tracing::info!(
        score = report.score,
        grade = %report.grade,
        mode = %report.mode,
        "Accessibility report: {} enhancement(s), {} suggestion(s), {} conformant",
        report.enhancements.len(),
        report.suggestions.len(),
        report.conformant.len()
    );
    for finding in &report.conformant {
        tracing::info!(source = finding.source.unwrap_or_default(), "conformant: {}", finding.message);
    }
    for finding in &report.enhancements {
        tracing::info!(source = finding.source.unwrap_or_default(), "enhanced: {}", finding.message);
    }
    for finding in &report.suggestions {
        let source = finding.source.unwrap_or_default();
        match finding.severity {
            Severity::Error => tracing::warn!(source, "to fix: {}", finding.message),
            Severity::Warning | Severity::Info => {
                tracing::info!(source, severity = finding.severity.as_str(), "to fix: {}", finding.message)
            }
        }
    }
    for failure in &report.failures {
        tracing::warn!(source = %failure.source, "rule failed: {}", failure.message);
    }
}
