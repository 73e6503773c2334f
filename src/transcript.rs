//! Transcript loading for `/api/extraction/process-summary`.
//!
//! JSON transcripts are flattened into `speaker: text` lines; anything else
//! (plain text, WebVTT) is sent as-is.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    /// Zoom's `{ "transcript": { "transcript_content": [...] } }` export.
    Zoom { transcript: ZoomTranscript },
    /// Plain segment array with timings.
    Segments(Vec<Segment>),
}

#[derive(Debug, Deserialize)]
struct ZoomTranscript {
    transcript_content: Vec<ZoomSegment>,
}

#[derive(Debug, Deserialize)]
struct ZoomSegment {
    speaker_name: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct Segment {
    speaker_name: String,
    sentence: String,
    #[serde(rename = "startTime")]
    start_time: serde_json::Value,
    #[serde(rename = "endTime")]
    end_time: serde_json::Value,
}

/// Read a transcript file and render it as the text sent to the service.
pub fn load_transcript(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transcript {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        render_json(&raw).with_context(|| format!("unsupported JSON transcript {}", path.display()))
    } else {
        Ok(raw)
    }
}

fn render_json(raw: &str) -> Result<String> {
    let file: TranscriptFile = serde_json::from_str(raw)?;
    let mut out = String::new();
    match file {
        TranscriptFile::Zoom { transcript } => {
            tracing::debug!(
                segments = transcript.transcript_content.len(),
                "zoom transcript detected"
            );
            for seg in transcript.transcript_content {
                let _ = write!(out, "{}: {} ", seg.speaker_name, seg.text);
            }
        }
        TranscriptFile::Segments(segments) => {
            for seg in segments {
                let _ = write!(
                    out,
                    "{}[{}-{}]: {} ",
                    seg.speaker_name,
                    plain(&seg.start_time),
                    plain(&seg.end_time),
                    seg.sentence
                );
            }
        }
    }
    Ok(out)
}

/// Timings come as numbers or strings; print strings without quotes.
fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tmp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn zoom_transcript_is_flattened() {
        let (_dir, path) = write_tmp(
            "meeting.json",
            r#"{"transcript": {"transcript_content": [
                {"speaker_name": "Ana", "text": "Morning all", "start_time": 0, "end_time": 2},
                {"speaker_name": "Raj", "text": "Hi", "start_time": 2, "end_time": 3}
            ]}}"#,
        );
        assert_eq!(load_transcript(&path).unwrap(), "Ana: Morning all Raj: Hi ");
    }

    #[test]
    fn segment_array_includes_timings() {
        let (_dir, path) = write_tmp(
            "call.JSON",
            r#"[{"speaker_name": "Ana", "sentence": "Ship it", "startTime": "00:01", "endTime": 4}]"#,
        );
        assert_eq!(load_transcript(&path).unwrap(), "Ana[00:01-4]: Ship it ");
    }

    #[test]
    fn plain_text_is_passed_through() {
        let (_dir, path) = write_tmp("notes.vtt", "WEBVTT\n\n00:00.000 --> 00:01.000\nHello");
        assert!(load_transcript(&path).unwrap().starts_with("WEBVTT"));
    }

    #[test]
    fn unknown_json_shape_is_an_error() {
        let (_dir, path) = write_tmp("odd.json", r#"{"lines": []}"#);
        assert!(load_transcript(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_transcript("/no/such/transcript.txt").is_err());
    }
}
