//! Video and audio

use super::{has_value, select, short_source};
use crate::{Finding, RuleResult, Severity};
use lumen_dom::{Document, DomTree, NodeId};

const DEFAULT_VIDEO_LABEL: &str = "Video";

#[derive(Debug, Clone)]
pub struct MediaRule {
    audit_only: bool,
}

impl MediaRule {
    pub fn new(audit_only: bool) -> Self {
        Self { audit_only }
    }

    pub fn run(&self, document: &mut Document) -> RuleResult<Vec<Finding>> {
        let mut findings = Vec::new();

        for video in select(&document.tree, "video")? {
            let tree = &document.tree;
            let tracks = TrackKinds::of(tree, video);
            if !tracks.captions && !tracks.subtitles {
                findings.push(
                    Finding::suggestion(format!("Video without subtitles: {}", video_source(tree, video)))
                        .with_fix("Add a <track kind=\"captions\"> or <track kind=\"subtitles\">.")
                        .on(video),
                );
            } else if !tracks.captions {
                findings.push(
                    Finding::suggestion("Video has subtitles but no captions")
                        .with_fix("Captions also describe sounds and speakers; add a <track kind=\"captions\">.")
                        .with_severity(Severity::Info)
                        .on(video),
                );
            }

            if has_value(tree, video, "aria-label") || has_value(tree, video, "aria-labelledby") {
                continue;
            }
            let label = tree
                .attr_trimmed(video, "title")
                .unwrap_or(DEFAULT_VIDEO_LABEL)
                .to_string();
            if self.audit_only {
                findings.push(
                    Finding::suggestion("Video player without accessible name")
                        .with_fix(format!("Add aria-label=\"{label}\"."))
                        .with_severity(Severity::Info)
                        .on(video),
                );
            } else {
                document.tree.set_attribute(video, "aria-label", &label)?;
                findings.push(Finding::enhancement(format!("aria-label \"{label}\" added to <video>")).on(video));
            }
        }

        let tree = &document.tree;
        for media in select(tree, "video[autoplay], audio[autoplay]")? {
            if tree.has_attr(media, "muted") {
                continue;
            }
            let tag = tree.tag_name(media).unwrap_or("video");
            findings.push(
                Finding::suggestion(format!("Autoplaying <{tag}> with sound"))
                    .with_fix("Remove autoplay, mute the media, or give users a way to stop it within 3 seconds.")
                    .on(media),
            );
        }

        for audio in select(tree, "audio:not([controls])")? {
            findings.push(
                Finding::suggestion("Audio without controls")
                    .with_fix("Add the controls attribute so users can pause and adjust the volume.")
                    .on(audio),
            );
        }

        Ok(findings)
    }
}

#[derive(Default)]
struct TrackKinds {
    captions: bool,
    subtitles: bool,
}

impl TrackKinds {
    fn of(tree: &DomTree, video: NodeId) -> Self {
        let mut kinds = Self::default();
        for track in tree.descendant_elements(video).filter(|&d| tree.is_tag(d, "track")) {
            match tree.attr(track, "kind").map(|k| k.trim().to_ascii_lowercase()).as_deref() {
                Some("captions") => kinds.captions = true,
                Some("subtitles") => kinds.subtitles = true,
                _ => {}
            }
        }
        kinds
    }
}

fn video_source(tree: &DomTree, video: NodeId) -> String {
    tree.descendant_elements(video)
        .filter(|&d| tree.is_tag(d, "source"))
        .find_map(|s| tree.attr_trimmed(s, "src"))
        .or_else(|| tree.attr_trimmed(video, "src"))
        .map(short_source)
        .unwrap_or_else(|| "(no source)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FindingKind;

    fn video(doc: &mut Document, attrs: &[(&str, &str)], tracks: &[&str]) -> NodeId {
        let body = doc.body().unwrap();
        let video = doc.tree.create_element("video");
        doc.tree.append_child(body, video).unwrap();
        for (name, value) in attrs {
            doc.tree.set_attribute(video, name, value).unwrap();
        }
        let source = doc.tree.create_element("source");
        doc.tree.set_attribute(source, "src", "/media/intro.mp4?v=3").unwrap();
        doc.tree.append_child(video, source).unwrap();
        for kind in tracks {
            let track = doc.tree.create_element("track");
            doc.tree.set_attribute(track, "kind", kind).unwrap();
            doc.tree.append_child(video, track).unwrap();
        }
        video
    }

    #[test]
    fn test_missing_tracks_and_label() {
        let mut doc = Document::new("about:blank");
        let v = video(&mut doc, &[("title", "Product tour")], &[]);
        let findings = MediaRule::new(false).run(&mut doc).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "Video without subtitles: intro.mp4");
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[1].kind, FindingKind::Enhancement);
        assert_eq!(doc.tree.attr(v, "aria-label"), Some("Product tour"));

        let again = MediaRule::new(false).run(&mut doc).unwrap();
        assert!(again.iter().all(|f| f.kind != FindingKind::Enhancement));
    }

    #[test]
    fn test_subtitles_without_captions() {
        let mut doc = Document::new("about:blank");
        video(&mut doc, &[("aria-label", "Tour")], &["Subtitles"]);
        let findings = MediaRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);

        let mut doc = Document::new("about:blank");
        video(&mut doc, &[("aria-label", "Tour")], &["captions"]);
        assert!(MediaRule::new(true).run(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_autoplay_and_audio_controls() {
        let mut doc = Document::new("about:blank");
        video(&mut doc, &[("aria-label", "Loop"), ("autoplay", ""), ("muted", "")], &["captions"]);
        let body = doc.body().unwrap();
        let audio = doc.tree.create_element("audio");
        doc.tree.set_attribute(audio, "autoplay", "").unwrap();
        doc.tree.append_child(body, audio).unwrap();

        let findings = MediaRule::new(true).run(&mut doc).unwrap();
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["Autoplaying <audio> with sound", "Audio without controls"]);
    }

    #[test]
    fn test_audit_default_label_is_suggested() {
        let mut doc = Document::new("about:blank");
        let v = video(&mut doc, &[], &["captions"]);
        let findings = MediaRule::new(true).run(&mut doc).unwrap();
        assert_eq!(findings[0].fix.as_deref(), Some("Add aria-label=\"Video\"."));
        assert!(!doc.tree.has_attr(v, "aria-label"));
    }
}
