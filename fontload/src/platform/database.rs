use std::path::PathBuf;

use async_trait::async_trait;
use fontdb::{Database, Query};
use getset::{CopyGetters, Getters};
use tokio::sync::{watch, OnceCell};

use crate::{
    config::Config,
    descriptor::FontDescriptor,
    error::{PlatformFontLoadError, PlatformFontLoadErrorKind},
    platform::FontSubsystem,
};

/// Where the faces of a [`FontDbSubsystem`] come from.
#[derive(Clone, Debug, Default, CopyGetters, Getters)]
pub struct FontSources {
    #[getset(get_copy = "pub")]
    system_fonts: bool,

    #[getset(get = "pub")]
    files: Vec<PathBuf>,

    #[getset(get = "pub")]
    folders: Vec<PathBuf>,
}

impl FontSources {
    pub fn new(system_fonts: bool, files: Vec<PathBuf>, folders: Vec<PathBuf>) -> Self {
        Self {
            system_fonts,
            files,
            folders,
        }
    }

    /// Blocking, it may scan whole font directories.
    fn load(&self) -> Result<Database, PlatformFontLoadErrorKind> {
        let mut db = Database::new();
        if self.system_fonts {
            db.load_system_fonts();
            tracing::debug!("fonts after loading system fonts: {}", db.len());
        }
        for font_path in &self.files {
            tracing::debug!("adding external font path: {:?}", font_path);
            db.load_font_file(font_path).map_err(|e| {
                PlatformFontLoadErrorKind::Source(format!("{}: {e}", font_path.display()))
            })?;
        }
        for folder in &self.folders {
            tracing::debug!("adding font folder: {:?}", folder);
            db.load_fonts_dir(folder);
        }
        tracing::debug!("fonts after loaded: {}", db.len());
        Ok(db)
    }
}

impl From<&Config> for FontSources {
    fn from(config: &Config) -> Self {
        Self::new(
            config.load_system_fonts(),
            config.external_font_paths().clone(),
            config.font_folders().clone(),
        )
    }
}

/// Decrements the in-flight counter when a request settles, however it settles.
struct InFlight<'a>(&'a watch::Sender<usize>);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a watch::Sender<usize>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

/// A [`FontSubsystem`] answering requests from a `fontdb` database.
///
/// The database is built on first use, on a blocking thread. If building it fails, the
/// request fails and the next request tries again.
pub struct FontDbSubsystem {
    sources: FontSources,
    db: OnceCell<Database>,
    in_flight: watch::Sender<usize>,
}

impl FontDbSubsystem {
    pub fn new(sources: FontSources) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            sources,
            db: OnceCell::new(),
            in_flight,
        }
    }

    /// Number of faces known so far, 0 before the first request.
    pub fn face_count(&self) -> usize {
        self.db.get().map(Database::len).unwrap_or(0)
    }

    async fn database(&self) -> Result<&Database, PlatformFontLoadErrorKind> {
        self.db
            .get_or_try_init(|| async {
                let sources = self.sources.clone();
                tokio::task::spawn_blocking(move || sources.load())
                    .await
                    .map_err(|e| PlatformFontLoadErrorKind::Aborted(e.to_string()))?
            })
            .await
    }
}

#[async_trait]
impl FontSubsystem for FontDbSubsystem {
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn request(&self, font: &str) -> Result<(), PlatformFontLoadError> {
        let _in_flight = InFlight::enter(&self.in_flight);

        let descriptor: FontDescriptor = font.parse().map_err(|e| {
            PlatformFontLoadError::new(
                font,
                PlatformFontLoadErrorKind::InvalidDescriptor(format!("{e}")),
            )
        })?;
        let db = self
            .database()
            .await
            .map_err(|kind| PlatformFontLoadError::new(font, kind))?;

        let families = descriptor.query_families();
        let query = Query {
            families: &families,
            weight: descriptor.weight(),
            stretch: descriptor.stretch(),
            style: descriptor.style(),
        };
        match db.query(&query) {
            Some(id) => {
                tracing::debug!("font {font:?} resolved to face {id:?}");
                Ok(())
            }
            None => Err(PlatformFontLoadError::no_matching_face(font)),
        }
    }

    async fn ready(&self) {
        let mut rx = self.in_flight.subscribe();
        if rx.wait_for(|n| *n == 0).await.is_err() {
            tracing::error!("in-flight counter of font requests is closed");
        }
    }
}
