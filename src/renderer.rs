//! The render operation: cache check, metadata lookup, image download,
//! composition, and atomic persist, in that order. Failures are surfaced
//! by [`ThumbnailRenderer::try_render`] and collapsed to `None` (after
//! structured logging) by [`ThumbnailRenderer::render`].

use std::path::PathBuf;

use anyhow::Context as _;
use image::ImageReader;

use crate::cache::ThumbnailCache;
use crate::compose::{self, AssetSet};
use crate::config::RendererConfig;
use crate::error::{ThumbError, ThumbResult};
use crate::fetch::{HttpFetcher, ImageFetcher, SourceFormat};
use crate::metadata::{MetadataProvider, SearchClient, VideoMetadata};

pub struct ThumbnailRenderer<P, F> {
    config: RendererConfig,
    cache: ThumbnailCache,
    provider: P,
    fetcher: F,
}

impl ThumbnailRenderer<SearchClient, HttpFetcher> {
    /// Renderer with the default network-backed provider and fetcher.
    pub fn new(config: RendererConfig) -> ThumbResult<Self> {
        let provider = SearchClient::new(&config)?;
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_parts(config, provider, fetcher))
    }
}

impl<P: MetadataProvider, F: ImageFetcher> ThumbnailRenderer<P, F> {
    /// Renderer with explicit collaborators (used by tests and embedders).
    pub fn with_parts(config: RendererConfig, provider: P, fetcher: F) -> Self {
        let cache = ThumbnailCache::new(&config.cache_dir, config.cache_format_version);
        Self {
            config,
            cache,
            provider,
            fetcher,
        }
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Render, collapsing every failure to `None`. The distinguished error
    /// kind is still visible in the log record.
    pub async fn render(&self, video_id: &str) -> Option<PathBuf> {
        match self.try_render(video_id).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(video_id, kind = e.kind(), error = %e, "thumbnail render failed");
                None
            }
        }
    }

    /// Render with the failure cause intact.
    pub async fn try_render(&self, video_id: &str) -> ThumbResult<PathBuf> {
        validate_video_id(video_id)?;

        if let Some(path) = self.cache.lookup(video_id) {
            tracing::debug!(video_id, path = %path.display(), "cache hit");
            return Ok(path);
        }

        let meta = self.provider.lookup(video_id).await?;
        let fetched = self.fetcher.fetch(&meta.thumbnail_url).await?;

        self.cache.ensure_root()?;
        let scratch = self.cache.scratch_path(video_id);
        tokio::fs::write(&scratch, &fetched.bytes)
            .await
            .map_err(|e| ThumbError::render(format!("write scratch file: {e}")))?;

        // Decode + compose + persist are CPU-bound; keep them off the
        // async runtime.
        let result = {
            let cache = self.cache.clone();
            let assets_dir = self.config.assets_dir.clone();
            let scratch = scratch.clone();
            let video_id = video_id.to_string();
            let format = fetched.format;
            tokio::task::spawn_blocking(move || {
                render_blocking(&cache, &assets_dir, &scratch, format, &video_id, &meta)
            })
            .await
            .map_err(|e| ThumbError::render(format!("render task panicked: {e}")))?
        };

        // The scratch file goes away on success and failure alike.
        tokio::fs::remove_file(&scratch).await.ok();

        result
    }
}

fn render_blocking(
    cache: &ThumbnailCache,
    assets_dir: &std::path::Path,
    scratch: &std::path::Path,
    format: SourceFormat,
    video_id: &str,
    meta: &VideoMetadata,
) -> ThumbResult<PathBuf> {
    // Decode with the format the server declared; the content-type gate
    // already rejected anything else.
    let mut reader = ImageReader::open(scratch)
        .with_context(|| format!("open scratch image '{}'", scratch.display()))?;
    reader.set_format(format.into());
    let source = reader
        .decode()
        .map_err(|e| ThumbError::render(format!("decode source image: {e}")))?
        .to_rgba8();

    let assets = AssetSet::load(assets_dir)?;
    let canvas = compose::compose(&source, meta, &assets, compose::random_progress_fraction())?;
    let path = cache.persist(video_id, &canvas)?;
    tracing::debug!(video_id, path = %path.display(), "thumbnail rendered");
    Ok(path)
}

/// Identifiers become file names; reject anything that could escape the
/// cache directory.
fn validate_video_id(video_id: &str) -> ThumbResult<()> {
    if video_id.is_empty() {
        return Err(ThumbError::lookup("video id must be non-empty"));
    }
    if video_id
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '.' || c.is_whitespace())
    {
        return Err(ThumbError::lookup(format!(
            "video id '{video_id}' contains path characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_validation() {
        assert!(validate_video_id("dQw4w9WgXcQ").is_ok());
        assert!(validate_video_id("abc_DEF-123").is_ok());
        assert!(validate_video_id("").is_err());
        assert!(validate_video_id("../etc/passwd").is_err());
        assert!(validate_video_id("a/b").is_err());
        assert!(validate_video_id("a b").is_err());
    }
}
