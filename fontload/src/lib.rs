//! Single-flight loading of fonts.
//!
//! [`FontLoadCache`] asks a [`FontSubsystem`] for each distinct font once and lets every caller
//! wait on that one request. [`FontDbSubsystem`] is a subsystem backed by a `fontdb` database.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod platform;

pub use cache::{FontLoad, FontLoadCache};
pub use config::{Config, FailurePolicy};
pub use error::{PlatformFontLoadError, PlatformFontLoadErrorKind};
pub use platform::{
    database::{FontDbSubsystem, FontSources},
    FontSubsystem,
};
