use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};

/// Resolves with the first of SIGINT, SIGTERM, SIGHUP or SIGQUIT delivered to the process.
///
/// Handlers are installed on the first poll, so the future has to be polled before the signals
/// it should catch arrive. Must be polled inside a tokio runtime.
pub async fn termination() -> Result<SignalKind> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    let kind = tokio::select! {
        _ = interrupt.recv() => SignalKind::interrupt(),
        _ = terminate.recv() => SignalKind::terminate(),
        _ = hangup.recv() => SignalKind::hangup(),
        _ = quit.recv() => SignalKind::quit(),
    };
    tracing::info!("stopping by signal: {:?}", kind);
    Ok(kind)
}
