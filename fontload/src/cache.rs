use std::{
    any::Any,
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard},
};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;

use crate::{
    config::FailurePolicy,
    error::{PlatformFontLoadError, PlatformFontLoadErrorKind},
    platform::FontSubsystem,
};

/// The outcome of one load, shared by everyone who asked for the same font.
pub type FontLoad = Shared<BoxFuture<'static, Result<(), PlatformFontLoadError>>>;

struct State {
    platform: Arc<dyn FontSubsystem>,
    policy: FailurePolicy,
    status: Mutex<HashMap<String, bool>>,
    pending: Mutex<HashMap<String, FontLoad>>,
}

impl State {
    fn status(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.status
            .lock()
            .expect("font status shouldn't be poisoned")
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, FontLoad>> {
        self.pending
            .lock()
            .expect("pending font loads shouldn't be poisoned")
    }
}

/// Remembers which fonts are loaded and makes sure each font is requested from the platform
/// only once, however many callers ask for it at the same time.
///
/// Clones share the same state. Create one for the application and hand clones around.
#[derive(Clone)]
pub struct FontLoadCache {
    state: Arc<State>,
}

impl FontLoadCache {
    pub fn new(platform: Arc<dyn FontSubsystem>) -> Self {
        Self::with_policy(platform, FailurePolicy::default())
    }

    pub fn with_policy(platform: Arc<dyn FontSubsystem>, policy: FailurePolicy) -> Self {
        Self {
            state: Arc::new(State {
                platform,
                policy,
                status: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.state.policy
    }

    /// True only once a load of `font` has succeeded.
    pub fn is_loaded(&self, font: &str) -> bool {
        self.state.status().get(font) == Some(&true)
    }

    /// Loads `font`, or joins the load already requested for it.
    ///
    /// The work is spawned on the current tokio runtime right away, so it completes even if the
    /// returned future is dropped. Outside a tokio runtime nothing is spawned or remembered and
    /// the returned future fails with [`PlatformFontLoadErrorKind::Aborted`].
    pub fn load(&self, font: &str) -> FontLoad {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!("unable to load font {font:?}: {e}");
                let e = PlatformFontLoadError::new(
                    font,
                    PlatformFontLoadErrorKind::Aborted(e.to_string()),
                );
                return future::ready(Err(e)).boxed().shared();
            }
        };

        // Held until the new load is registered, so racing callers can't start a second one.
        let mut pending = self.state.pending();
        if let Some(load) = pending.get(font) {
            tracing::debug!("font {font:?} is already requested");
            return load.clone();
        }

        tracing::debug!("requesting font {font:?}");
        let handle = runtime.spawn(Self::run(self.state.clone(), font.to_string()));
        let name = font.to_string();
        let load = async move {
            match handle.await {
                Ok(res) => res,
                Err(e) => {
                    tracing::error!("loading font {name:?} aborted: {e}");
                    Err(PlatformFontLoadError::new(
                        name,
                        PlatformFontLoadErrorKind::Aborted(e.to_string()),
                    ))
                }
            }
        }
        .boxed()
        .shared();
        pending.insert(font.to_string(), load.clone());
        load
    }

    /// Number of fonts ever requested and still remembered, loaded or not.
    pub fn requested_count(&self) -> usize {
        self.state.pending().len()
    }

    /// Fonts loaded so far, sorted.
    pub fn loaded_fonts(&self) -> Vec<String> {
        let mut fonts: Vec<String> = self
            .state
            .status()
            .iter()
            .filter(|(_, loaded)| **loaded)
            .map(|(font, _)| font.clone())
            .collect();
        fonts.sort_unstable();
        fonts
    }

    async fn run(state: Arc<State>, font: String) -> Result<(), PlatformFontLoadError> {
        let work = async {
            state.platform.request(&font).await?;
            state.platform.ready().await;
            Ok::<_, PlatformFontLoadError>(())
        };
        // A panicking platform still has to reach the eviction below.
        let res = match AssertUnwindSafe(work).catch_unwind().await {
            Ok(res) => res,
            Err(panic) => Err(PlatformFontLoadError::new(
                font.as_str(),
                PlatformFontLoadErrorKind::Aborted(panic_message(panic.as_ref())),
            )),
        };

        match &res {
            Ok(()) => {
                state.status().insert(font.clone(), true);
                tracing::info!("font {font:?} loaded");
            }
            Err(e) => {
                tracing::warn!("{e}");
                if state.policy == FailurePolicy::Evict {
                    state.pending().remove(&font);
                    tracing::debug!("failed load of font {font:?} is evicted");
                }
            }
        }
        res
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
