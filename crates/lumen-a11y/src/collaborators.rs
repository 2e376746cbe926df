//! Interfaces to the host's UI pieces
//!
//! The engine never draws, speaks or prints. Hosts plug their own renderer,
//! exporter, speech controller and screen-reader loader in through these
//! traits; the auditor only calls [`ReportRenderer`] itself.

use crate::Report;
use lumen_dom::Document;

/// Shows a report to the user after each non-silent pass
pub trait ReportRenderer {
    fn render(&mut self, report: &Report, document: &Document);
}

/// Turns a report into a printable or downloadable artefact
pub trait ReportExporter {
    fn export(&mut self, report: &Report, document: &Document);
}

/// Playback state of a text-to-speech reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Text-to-speech reader driven by the toolbar
pub trait SpeechController {
    fn start(&mut self, text: &str);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn state(&self) -> SpeechState;
    /// Register a listener for state transitions
    fn on_state_change(&mut self, listener: Box<dyn FnMut(SpeechState)>);
}

/// Loads a third-party screen-reader script for a license
pub trait ScriptLoader {
    fn load(&mut self, license_id: &str);
}
