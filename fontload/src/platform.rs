use async_trait::async_trait;

use crate::error::PlatformFontLoadError;

pub mod database;

/// The host's font machinery as seen by [`FontLoadCache`](crate::cache::FontLoadCache).
#[async_trait]
pub trait FontSubsystem: Send + Sync {
    /// Asks the platform to make the font named by `font` available.
    async fn request(&self, font: &str) -> Result<(), PlatformFontLoadError>;

    /// Resolves once every font requested so far has settled.
    async fn ready(&self);
}
