use getset::Getters;
use thiserror::Error;

/// Why the platform could not provide a font. Shared by every caller waiting on the same load,
/// so it only carries owned, cloneable data.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum PlatformFontLoadErrorKind {
    #[error("invalid font descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("no matching font face")]
    NoMatchingFace,
    #[error("unable to load font source: {0}")]
    Source(String),
    #[error("load task aborted: {0}")]
    Aborted(String),
    #[error("{0}")]
    Platform(String),
}

#[derive(Error, Clone, Debug, PartialEq, Eq, Getters)]
#[error("failed to load font {font:?}: {kind}")]
pub struct PlatformFontLoadError {
    #[getset(get = "pub")]
    font: String,

    #[getset(get = "pub")]
    kind: PlatformFontLoadErrorKind,
}

impl PlatformFontLoadError {
    pub fn new(font: impl Into<String>, kind: PlatformFontLoadErrorKind) -> Self {
        Self {
            font: font.into(),
            kind,
        }
    }

    pub fn no_matching_face(font: impl Into<String>) -> Self {
        Self::new(font, PlatformFontLoadErrorKind::NoMatchingFace)
    }

    pub fn platform(font: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(font, PlatformFontLoadErrorKind::Platform(reason.into()))
    }
}
