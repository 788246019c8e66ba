use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("media reference cannot be empty")]
    EmptyUri,

    #[error("media URL is not valid: {0}")]
    InvalidUrl(String),

    #[error("unknown media kind: {0}")]
    UnknownKind(String),
}

//
// ─── MEDIA REFERENCE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// # Errors
    ///
    /// Returns `MediaError::UnknownKind` for anything but `image` or `video`.
    pub fn parse(raw: &str) -> Result<Self, MediaError> {
        match raw.trim() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(MediaError::UnknownKind(other.to_owned())),
        }
    }
}

/// Where a piece of media lives: a local file or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaUri {
    FilePath(PathBuf),
    Url(Url),
}

impl MediaUri {
    /// # Errors
    ///
    /// Returns `MediaError::EmptyUri` for an empty path.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(MediaError::EmptyUri);
        }
        Ok(MediaUri::FilePath(path))
    }

    /// # Errors
    ///
    /// Returns `MediaError::EmptyUri` for blank input, `InvalidUrl` if parsing fails.
    pub fn from_url(raw: impl AsRef<str>) -> Result<Self, MediaError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(MediaError::EmptyUri);
        }
        Url::parse(raw)
            .map(MediaUri::Url)
            .map_err(|e| MediaError::InvalidUrl(e.to_string()))
    }

    /// Parses persisted text: anything with a scheme is a URL, the rest is a path.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if the value is blank or a malformed URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MediaError> {
        let raw = raw.as_ref().trim();
        if raw.contains("://") {
            Self::from_url(raw)
        } else {
            Self::from_file(raw)
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            MediaUri::FilePath(p) => Some(p.as_path()),
            MediaUri::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            MediaUri::Url(u) => Some(u),
            MediaUri::FilePath(_) => None,
        }
    }
}

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaUri::FilePath(p) => write!(f, "{}", p.display()),
            MediaUri::Url(u) => write!(f, "{u}"),
        }
    }
}

/// Optional illustration attached to intro or reading content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    uri: MediaUri,
    kind: MediaKind,
}

impl MediaRef {
    #[must_use]
    pub fn new(uri: MediaUri, kind: MediaKind) -> Self {
        Self { uri, kind }
    }

    #[must_use]
    pub fn image(uri: MediaUri) -> Self {
        Self::new(uri, MediaKind::Image)
    }

    #[must_use]
    pub fn uri(&self) -> &MediaUri {
        &self.uri
    }

    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_urls_from_paths() {
        let url = MediaUri::parse("https://images.example.com/listen.jpg").unwrap();
        assert!(url.as_url().is_some());

        let path = MediaUri::parse("media/listen.jpg").unwrap();
        assert_eq!(path.as_path(), Some(Path::new("media/listen.jpg")));
        assert_eq!(path.to_string(), "media/listen.jpg");
    }

    #[test]
    fn parse_rejects_blank_and_broken_urls() {
        assert_eq!(MediaUri::parse("  "), Err(MediaError::EmptyUri));
        assert!(matches!(
            MediaUri::parse("http://exa mple.com"),
            Err(MediaError::InvalidUrl(_))
        ));
    }

    #[test]
    fn kind_parses_known_values() {
        assert_eq!(MediaKind::parse("video"), Ok(MediaKind::Video));
        assert_eq!(
            MediaKind::parse("gif"),
            Err(MediaError::UnknownKind("gif".into()))
        );
    }
}
