pub type ThumbResult<T> = Result<T, ThumbError>;

#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("download error: {0}")]
    Download(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThumbError {
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Stable kind tag for structured logging at the collapse boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lookup(_) => "lookup",
            Self::Download(_) => "download",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Render(_) => "render",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ThumbError::lookup("x")
                .to_string()
                .contains("lookup error:")
        );
        assert!(
            ThumbError::download("x")
                .to_string()
                .contains("download error:")
        );
        assert!(
            ThumbError::unsupported_format("x")
                .to_string()
                .contains("unsupported format:")
        );
        assert!(
            ThumbError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(ThumbError::lookup("x").kind(), "lookup");
        assert_eq!(ThumbError::download("x").kind(), "download");
        assert_eq!(
            ThumbError::unsupported_format("x").kind(),
            "unsupported_format"
        );
        assert_eq!(ThumbError::render("x").kind(), "render");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ThumbError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.kind(), "other");
    }
}
