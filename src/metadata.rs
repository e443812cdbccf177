//! Video metadata resolution.
//!
//! The renderer only needs five strings per video; [`MetadataProvider`] is
//! the seam that supplies them. [`SearchClient`] implements it against an
//! Invidious-compatible JSON search API, applying the same normalization
//! the composition expects: sanitized title, `"Live"` duration sentinel,
//! first thumbnail URL with its query string stripped, and fallback strings
//! for absent fields.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::RendererConfig;
use crate::error::{ThumbError, ThumbResult};
use crate::layout::{LIVE_SENTINEL, TITLE_LINE_MAX};

/// Everything the composition reads about one video. Immutable for the
/// duration of a render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Sanitized, title-cased title.
    pub title: String,
    /// Formatted duration, or [`LIVE_SENTINEL`] for live streams.
    pub duration: String,
    /// Source image URL, query string stripped.
    pub thumbnail_url: String,
    /// Short view-count summary ("1.2M views").
    pub views: String,
    /// Channel name.
    pub channel: String,
}

impl VideoMetadata {
    pub fn is_live(&self) -> bool {
        self.duration == LIVE_SENTINEL
    }
}

/// Resolves metadata for a video identifier.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn lookup(&self, video_id: &str) -> ThumbResult<VideoMetadata>;
}

#[async_trait]
impl<T: MetadataProvider + ?Sized> MetadataProvider for std::sync::Arc<T> {
    async fn lookup(&self, video_id: &str) -> ThumbResult<VideoMetadata> {
        (**self).lookup(video_id).await
    }
}

/// Strip every non-word character (replaced by a single space) and
/// title-case the result. Word characters are alphanumerics and `_`.
pub fn sanitize_title(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if pending_space && !cleaned.is_empty() {
                cleaned.push(' ');
            }
            pending_space = false;
            cleaned.push(ch);
        } else {
            pending_space = true;
        }
    }

    // Title-case: uppercase every character that follows a non-alphabetic
    // one, lowercase the rest.
    let mut out = String::with_capacity(cleaned.len());
    let mut prev_alpha = false;
    for ch in cleaned.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Greedily pack whole words into at most two lines, each kept strictly
/// under [`TITLE_LINE_MAX`] characters. Words that fit neither line are
/// dropped.
pub fn truncate_title(title: &str) -> [String; 2] {
    let mut line1 = String::new();
    let mut line2 = String::new();
    for word in title.split(' ').filter(|w| !w.is_empty()) {
        let len = word.chars().count();
        if packed_len(&line1, len) < TITLE_LINE_MAX {
            if !line1.is_empty() {
                line1.push(' ');
            }
            line1.push_str(word);
        } else if packed_len(&line2, len) < TITLE_LINE_MAX {
            if !line2.is_empty() {
                line2.push(' ');
            }
            line2.push_str(word);
        }
    }
    [line1, line2]
}

/// Length of `line` after appending one more word of `word_len` characters
/// (plus its separating space). Appending is allowed while this stays under
/// [`TITLE_LINE_MAX`], so finished lines never reach the limit.
fn packed_len(line: &str, word_len: usize) -> usize {
    let current = line.chars().count();
    if current == 0 {
        word_len
    } else {
        current + 1 + word_len
    }
}

/// Format whole seconds as `m:ss` or `h:mm:ss`.
pub fn format_duration(total_secs: u64) -> String {
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Metadata lookup over an Invidious-compatible `/api/v1/search` endpoint.
#[derive(Clone, Debug)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    title: Option<String>,
    #[serde(default)]
    length_seconds: Option<u64>,
    #[serde(default)]
    live_now: bool,
    #[serde(default)]
    video_thumbnails: Vec<SearchThumbnail>,
    #[serde(default)]
    view_count_text: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchThumbnail {
    url: String,
}

impl SearchClient {
    pub fn new(config: &RendererConfig) -> ThumbResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| ThumbError::lookup(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.search_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn into_metadata(item: SearchItem) -> ThumbResult<VideoMetadata> {
        let title = match item.title.as_deref() {
            Some(t) if !t.trim().is_empty() => sanitize_title(t),
            _ => "Unsupported Title".to_string(),
        };

        let duration = if item.live_now {
            LIVE_SENTINEL.to_string()
        } else {
            match item.length_seconds {
                Some(secs) if secs > 0 => format_duration(secs),
                _ => LIVE_SENTINEL.to_string(),
            }
        };

        let thumbnail_url = item
            .video_thumbnails
            .first()
            .map(|t| strip_query(&t.url))
            .ok_or_else(|| ThumbError::lookup("search result has no thumbnail"))?;

        Ok(VideoMetadata {
            title,
            duration,
            thumbnail_url,
            views: item
                .view_count_text
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "Unknown Views".to_string()),
            channel: item
                .author
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown Channel".to_string()),
        })
    }
}

fn strip_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

#[async_trait]
impl MetadataProvider for SearchClient {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, video_id: &str) -> ThumbResult<VideoMetadata> {
        let url = format!("{}/api/v1/search", self.base_url);
        let items: Vec<SearchItem> = self
            .http
            .get(&url)
            .query(&[("q", video_id), ("type", "video")])
            .send()
            .await
            .map_err(|e| ThumbError::lookup(format!("search request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ThumbError::lookup(format!("search returned error status: {e}")))?
            .json()
            .await
            .map_err(|e| ThumbError::lookup(format!("decode search response: {e}")))?;

        let first = items
            .into_iter()
            .next()
            .ok_or_else(|| ThumbError::lookup(format!("no search results for '{video_id}'")))?;
        Self::into_metadata(first)
    }
}
