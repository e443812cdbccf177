//! Disk cache for finished thumbnails.
//!
//! The contract is intentionally small: the cache path is a pure function
//! of the video identifier plus the format version, and the existence of
//! that file is the entire validity check. There is no index, expiry, or
//! eviction. Saves go through a temp sibling and an atomic rename so a
//! racing render of the same identifier can only ever lose whole (last
//! write wins), never tear the file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{ImageFormat, RgbaImage};

use crate::error::{ThumbError, ThumbResult};

#[derive(Clone, Debug)]
pub struct ThumbnailCache {
    root: PathBuf,
    format_version: u32,
}

impl ThumbnailCache {
    pub fn new(root: impl Into<PathBuf>, format_version: u32) -> Self {
        Self {
            root: root.into(),
            format_version,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for a finished thumbnail: `{id}_v{version}.png`.
    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.root
            .join(format!("{video_id}_v{}.png", self.format_version))
    }

    /// Scratch path for the downloaded source image of one render.
    pub fn scratch_path(&self, video_id: &str) -> PathBuf {
        self.root.join(format!("thumb{video_id}.png"))
    }

    /// Present-on-disk check; presence means valid.
    pub fn lookup(&self, video_id: &str) -> Option<PathBuf> {
        let path = self.path_for(video_id);
        path.is_file().then_some(path)
    }

    pub fn ensure_root(&self) -> ThumbResult<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create cache dir '{}'", self.root.display()))?;
        Ok(())
    }

    /// Encode the finished canvas as PNG and move it into the canonical
    /// path via temp file + rename.
    pub fn persist(&self, video_id: &str, canvas: &RgbaImage) -> ThumbResult<PathBuf> {
        self.ensure_root()?;

        let mut encoded = Vec::new();
        image::DynamicImage::ImageRgba8(canvas.clone())
            .write_to(&mut std::io::Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| ThumbError::render(format!("encode thumbnail png: {e}")))?;

        let target = self.path_for(video_id);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("create temp file in '{}'", self.root.display()))?;
        tmp.write_all(&encoded)
            .context("write thumbnail to temp file")?;
        tmp.persist(&target)
            .map_err(|e| ThumbError::render(format!("persist thumbnail: {e}")))?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "aurathumb_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn path_is_deterministic_and_versioned() {
        let cache = ThumbnailCache::new("cache", 4);
        assert_eq!(cache.path_for("abc"), PathBuf::from("cache/abc_v4.png"));
        assert_eq!(cache.path_for("abc"), cache.path_for("abc"));

        let v5 = ThumbnailCache::new("cache", 5);
        assert_ne!(cache.path_for("abc"), v5.path_for("abc"));
    }

    #[test]
    fn lookup_misses_then_hits_after_persist() {
        let root = temp_dir("cache_roundtrip");
        let cache = ThumbnailCache::new(&root, 4);
        assert!(cache.lookup("vid").is_none());

        let canvas = RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 255]));
        let saved = cache.persist("vid", &canvas).unwrap();
        assert_eq!(saved, cache.path_for("vid"));
        assert_eq!(cache.lookup("vid"), Some(saved.clone()));

        // The persisted file is a decodable PNG of the same dimensions.
        let decoded = image::open(&saved).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));

        // No temp files left behind.
        let stray: Vec<_> = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n != "vid_v4.png")
            .collect();
        assert!(stray.is_empty(), "stray files: {stray:?}");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn scratch_path_is_cache_scoped() {
        let cache = ThumbnailCache::new("cache", 4);
        assert_eq!(cache.scratch_path("x"), PathBuf::from("cache/thumbx.png"));
    }
}
