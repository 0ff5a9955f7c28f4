//! YouTube caption tracks via yt-dlp.
//!
//! `yt-dlp --dump-json` lists the manual and automatic caption tracks of a
//! video without downloading it. The `json3` track for the requested language
//! is then fetched over HTTP and parsed into timed segments.

use super::{Transcript, TranscriptSegment, TranscriptSource};
use crate::error::{Result, SvarError};
use crate::source::watch_url;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

const CAPTION_FORMAT: &str = "json3";

/// YouTube transcript source backed by yt-dlp.
pub struct YoutubeTranscriptSource {
    ytdlp_path: String,
    http: reqwest::Client,
}

impl YoutubeTranscriptSource {
    pub fn new() -> Result<Self> {
        Self::with_ytdlp("yt-dlp")
    }

    /// Use a specific yt-dlp executable.
    pub fn with_ytdlp(ytdlp_path: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            ytdlp_path: ytdlp_path.to_string(),
            http,
        })
    }

    /// Fetch video metadata (including caption track listings) using yt-dlp.
    async fn fetch_metadata(&self, video_id: &str) -> Result<Value> {
        let url = watch_url(video_id);

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SvarError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    SvarError::TranscriptUnavailable(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SvarError::SourceInvalid(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript> {
        let metadata = self.fetch_metadata(video_id).await?;

        let track = select_caption_track(&metadata, language).ok_or_else(|| {
            SvarError::TranscriptUnavailable(format!(
                "No '{}' transcript available for video {} (transcripts may be disabled)",
                language, video_id
            ))
        })?;

        info!(
            "Downloading {} captions ({})",
            if track.automatic { "automatic" } else { "manual" },
            track.language
        );

        let body = self
            .http
            .get(&track.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_json3(&body)?;
        let transcript = Transcript::new(video_id, segments);

        if transcript.is_empty() {
            return Err(SvarError::TranscriptUnavailable(format!(
                "The '{}' transcript for video {} is empty",
                language, video_id
            )));
        }

        debug!(
            "Fetched {} segments, {} characters",
            transcript.segments.len(),
            transcript.text.len()
        );
        Ok(transcript)
    }
}

/// A downloadable caption track.
#[derive(Debug, Clone, PartialEq)]
struct CaptionTrack {
    language: String,
    url: String,
    automatic: bool,
}

/// Pick the caption track for `language`, preferring manual over automatic
/// captions and an exact language code over a regional variant (`en-GB`).
fn select_caption_track(metadata: &Value, language: &str) -> Option<CaptionTrack> {
    [("subtitles", false), ("automatic_captions", true)]
        .into_iter()
        .find_map(|(field, automatic)| {
            let tracks = metadata.get(field)?.as_object()?;

            let (lang, formats) = match tracks.get(language) {
                Some(formats) => (language.to_string(), formats),
                None => {
                    let prefix = format!("{}-", language);
                    let (key, formats) = tracks.iter().find(|(key, _)| key.starts_with(&prefix))?;
                    (key.clone(), formats)
                }
            };

            let url = formats
                .as_array()?
                .iter()
                .find(|f| f["ext"].as_str() == Some(CAPTION_FORMAT))?["url"]
                .as_str()?;

            Some(CaptionTrack {
                language: lang,
                url: url.to_string(),
                automatic,
            })
        })
}

#[derive(Debug, Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a YouTube `json3` caption document into segments.
fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let captions: Json3Captions = serde_json::from_str(body)?;

    let segments = captions
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            let start = event.t_start_ms as f64 / 1000.0;
            let end = (event.t_start_ms + event.d_duration_ms) as f64 / 1000.0;
            Some(TranscriptSegment::new(start, end, text))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> Value {
        json!({
            "id": "dQw4w9WgXcQ",
            "subtitles": {
                "de": [{"ext": "json3", "url": "https://example.com/de.json3"}]
            },
            "automatic_captions": {
                "en": [
                    {"ext": "vtt", "url": "https://example.com/en.vtt"},
                    {"ext": "json3", "url": "https://example.com/en-auto.json3"}
                ],
                "fr-CA": [{"ext": "json3", "url": "https://example.com/fr-ca.json3"}]
            }
        })
    }

    #[test]
    fn test_select_manual_track() {
        let track = select_caption_track(&metadata(), "de").unwrap();
        assert_eq!(track.url, "https://example.com/de.json3");
        assert!(!track.automatic);
    }

    #[test]
    fn test_select_falls_back_to_automatic_json3() {
        let track = select_caption_track(&metadata(), "en").unwrap();
        assert_eq!(track.url, "https://example.com/en-auto.json3");
        assert!(track.automatic);
    }

    #[test]
    fn test_select_regional_variant() {
        let track = select_caption_track(&metadata(), "fr").unwrap();
        assert_eq!(track.language, "fr-CA");
    }

    #[test]
    fn test_select_missing_language() {
        assert!(select_caption_track(&metadata(), "ja").is_none());
        assert!(select_caption_track(&json!({"id": "x"}), "en").is_none());
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 2000, "segs": [{"utf8": "hello "}, {"utf8": "there"}]},
                {"tStartMs": 2000, "dDurationMs": 10, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2100, "dDurationMs": 1500, "segs": [{"utf8": "general\nkenobi"}]},
                {"tStartMs": 4000, "dDurationMs": 500}
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new(0.0, 2.0, "hello there"),
                TranscriptSegment::new(2.1, 3.6, "general kenobi"),
            ]
        );
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(matches!(parse_json3("not json"), Err(SvarError::Json(_))));
    }
}
