//! Video identifier parsing.
//!
//! Turns the URL a user pastes into the 11-character YouTube video ID that the
//! transcript source works with.

use crate::error::{Result, SvarError};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"));

/// Extract a video ID from a YouTube URL or bare ID.
///
/// Accepts `watch?v=`, `youtu.be/`, `embed/`, `v/`, `shorts/` and `live/` forms,
/// with or without a scheme.
pub fn parse_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    if VIDEO_ID.is_match(input) {
        return Ok(input.to_string());
    }

    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{}", input))
    }
    .map_err(|_| SvarError::SourceInvalid(format!("Invalid YouTube URL: {}", input)))?;

    extract_from_url(&url)
        .ok_or_else(|| SvarError::SourceInvalid(format!("Invalid YouTube URL: {}", input)))
}

fn extract_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed") | Some("v") | Some("shorts") | Some("live") => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            }
        }
        _ => None,
    }?;

    VIDEO_ID.is_match(&candidate).then_some(candidate)
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
