//! aurathumb renders stylized cover-art thumbnails for video identifiers.
//!
//! One call does everything: [`ThumbnailRenderer::render`] resolves
//! metadata for the identifier, downloads the preview image, composites
//! the aura-styled 1280x720 canvas (blurred and tinted background, glow
//! glyphs, circular avatar with halo, shadowed text, progress indicator,
//! icon strip), and persists the result under a deterministic cache path.
//! A cached identifier short-circuits before any network access.
//!
//! The pipeline is strictly sequential and CPU-first: premultiplied RGBA8
//! end-to-end, with straight alpha only at the decode and encode
//! boundaries. The two network collaborators sit behind the
//! [`MetadataProvider`] and [`ImageFetcher`] traits so embedders and tests
//! can replace them.
//!
//! The progress indicator's fill fraction is cosmetic and randomized per
//! render; output images are not bit-for-bit reproducible.

#![forbid(unsafe_code)]

mod cache;
mod compose;
mod config;
mod error;
mod fetch;
mod frame;
mod fx;
mod layout;
mod metadata;
mod renderer;
mod shapes;
mod text;

pub use cache::ThumbnailCache;
pub use compose::{
    AssetSet, ICON_STRIP_FILE, LABEL_FONT_FILE, TITLE_FONT_FILE, compose,
    random_progress_fraction,
};
pub use config::RendererConfig;
pub use error::{ThumbError, ThumbResult};
pub use fetch::{FetchedImage, HttpFetcher, ImageFetcher, SourceFormat, source_format_from_content_type};
pub use frame::{Frame, Rgba8, premultiply};
pub use fx::{adjust_brightness, adjust_contrast, adjust_saturation, blur, over, tint};
pub use metadata::{
    MetadataProvider, SearchClient, VideoMetadata, format_duration, sanitize_title,
    truncate_title,
};
pub use renderer::ThumbnailRenderer;
