//! Process-wide stop flag for the servers, the session workers and the sweeps.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

/// Latched stop flag. Every clone observes the same trigger.
#[derive(Clone)]
pub struct ShutdownSignal {
    stopped: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            stopped: Arc::new(stopped),
        }
    }

    pub fn trigger(&self) {
        if !self.stopped.send_replace(true) {
            info!("🛑 Shutdown signal triggered");
        }
    }

    /// Subscribes immediately, so a trigger between this call and `wait` is not missed.
    pub fn notified(&self) -> StopWaiter {
        StopWaiter {
            rx: self.stopped.subscribe(),
        }
    }

    pub async fn wait(&self) {
        self.notified().wait().await
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StopWaiter {
    rx: watch::Receiver<bool>,
}

impl StopWaiter {
    pub async fn wait(mut self) {
        // Err means every sender is gone; nothing can trigger any more, so stop too.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

async fn os_stop_request() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = term.recv() => Ok("SIGTERM"),
            res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}

/// Owns the signal for `main` and bounds the final cleanup.
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    timeout_secs: u64,
}

impl ShutdownCoordinator {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            signal: ShutdownSignal::new(),
            timeout_secs,
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn start_signal_listener(&self) {
        let signal = self.signal.clone();
        tokio::spawn(async move {
            match os_stop_request().await {
                Ok(name) => {
                    info!("📡 Received {}", name);
                    signal.trigger();
                }
                Err(e) => error!(error = %e, "Failed to install signal handlers"),
            }
        });
    }

    /// Waits for the signal, then gives `cleanup` at most the configured timeout.
    /// Returns `false` when it ran out of time.
    pub async fn shutdown_with_cleanup<F, Fut>(&self, cleanup: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.signal.wait().await;
        let limit = Duration::from_secs(self.timeout_secs);
        info!("⏳ Graceful shutdown, {}s allowed", self.timeout_secs);

        let finished = tokio::time::timeout(limit, cleanup()).await.is_ok();
        if finished {
            info!("✅ Graceful shutdown completed");
        } else {
            warn!("⚠️ Cleanup still running after {}s, giving up", self.timeout_secs);
        }
        finished
    }
}
