//! Source image download. The fetcher is a trait so tests (and embedders
//! with their own HTTP stack) can swap the network out; [`HttpFetcher`] is
//! the `reqwest` implementation with a request timeout.

use async_trait::async_trait;

use crate::config::RendererConfig;
use crate::error::{ThumbError, ThumbResult};

/// Raster formats the pipeline accepts from the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

/// Downloaded source image bytes plus the format declared by the server.
/// The declaration is authoritative: decoding uses it instead of sniffing.
#[derive(Clone, Debug)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub format: SourceFormat,
}

impl From<SourceFormat> for image::ImageFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Jpeg => image::ImageFormat::Jpeg,
            SourceFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Downloads the preview image for a render.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ThumbResult<FetchedImage>;
}

#[async_trait]
impl<T: ImageFetcher + ?Sized> ImageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> ThumbResult<FetchedImage> {
        (**self).fetch(url).await
    }
}

/// Map a declared `Content-Type` to an accepted [`SourceFormat`].
pub fn source_format_from_content_type(content_type: &str) -> Option<SourceFormat> {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("jpeg") || ct.contains("jpg") {
        Some(SourceFormat::Jpeg)
    } else if ct.contains("png") {
        Some(SourceFormat::Png)
    } else {
        None
    }
}

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &RendererConfig) -> ThumbResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| ThumbError::download(format!("build http client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> ThumbResult<FetchedImage> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ThumbError::download(format!("image request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ThumbError::download(format!(
                "image request returned status {}",
                resp.status()
            )));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let format = source_format_from_content_type(&content_type).ok_or_else(|| {
            ThumbError::unsupported_format(format!(
                "content type '{content_type}' is not JPEG or PNG"
            ))
        })?;

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ThumbError::download(format!("read image body: {e}")))?;

        tracing::debug!(len = bytes.len(), ?format, "source image downloaded");
        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            format,
        })
    }
}
