use std::fmt::{Display, Formatter, Result as FmtResult};

use anyhow::Result;
#[cfg(feature = "console-subscriber")]
use tempfile::{NamedTempFile, TempPath};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Holds what the installed subscriber needs for as long as the process logs.
pub struct LogGuard {
    #[cfg(feature = "console-subscriber")]
    socket: TempPath,
}

impl LogGuard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            #[cfg(feature = "console-subscriber")]
            socket: NamedTempFile::with_prefix("fontload-tokio-console-")?.into_temp_path(),
        })
    }
}

impl Display for LogGuard {
    #[cfg(feature = "console-subscriber")]
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_fmt(format_args!("console_subscriber addr: {:?}", self.socket))
    }

    #[cfg(not(feature = "console-subscriber"))]
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("console_subscriber disabled")
    }
}

/// `RUST_LOG` first, then every configured directive on top of it.
pub fn env_filter(directives: &[String]) -> Result<EnvFilter> {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in directives {
        env_filter = env_filter.add_directive(directive.parse()?);
    }
    Ok(env_filter)
}

pub fn init_log(directives: &[String], log_timestamp: bool) -> Result<LogGuard> {
    let env_filter = env_filter(directives)?;
    let log_guard = LogGuard::new()?;
    let subscriber = tracing_subscriber::registry().with(env_filter);
    #[cfg(feature = "console-subscriber")]
    let subscriber = {
        let socket_file_path = log_guard.socket.to_path_buf();
        // console_subscriber wants to create the socket itself.
        std::fs::remove_file(&socket_file_path)?;
        subscriber.with(
            console_subscriber::ConsoleLayer::builder()
                .with_default_env()
                .server_addr(socket_file_path)
                .spawn(),
        )
    };

    if log_timestamp {
        subscriber.with(fmt::layer()).try_init()?;
    } else {
        subscriber.with(fmt::layer().without_time()).try_init()?;
    }
    tracing::debug!("{}", log_guard);
    Ok(log_guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_target_directives() {
        let directives = vec!["fontload=debug".to_string(), "warn".to_string()];
        assert!(env_filter(&directives).is_ok());
    }

    #[test]
    fn rejects_malformed_directive() {
        let directives = vec!["fontload=notalevel".to_string()];
        assert!(env_filter(&directives).is_err());
    }
}
