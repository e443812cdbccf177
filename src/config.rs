use std::path::PathBuf;
use std::time::Duration;

/// Renderer configuration.
///
/// Every field has a working default; deserialize partial overrides from
/// JSON when embedding the renderer in a larger service.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Flat directory holding finished thumbnails and per-render scratch files.
    pub cache_dir: PathBuf,
    /// Directory holding the two font files and the icon strip.
    pub assets_dir: PathBuf,
    /// Base URL of an Invidious-compatible search API.
    pub search_base_url: String,
    /// Timeout applied to the metadata lookup and the image download.
    #[serde(with = "secs")]
    pub fetch_timeout: Duration,
    /// Version tag baked into cache file names; bump to invalidate old art.
    pub cache_format_version: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            assets_dir: PathBuf::from("assets"),
            search_base_url: "https://yewtu.be".to_string(),
            fetch_timeout: Duration::from_secs(15),
            cache_format_version: 4,
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_usable() {
        let cfg = RendererConfig::default();
        assert_eq!(cfg.cache_format_version, 4);
        assert!(!cfg.search_base_url.is_empty());
        assert!(cfg.fetch_timeout > Duration::ZERO);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: RendererConfig =
            serde_json::from_str(r#"{ "cache_dir": "/tmp/t", "fetch_timeout": 3 }"#).unwrap();
        assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/t"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
        assert_eq!(cfg.cache_format_version, RendererConfig::default().cache_format_version);
    }
}
