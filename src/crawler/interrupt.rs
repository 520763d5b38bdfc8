//! Cooperative cancellation
//!
//! A background task flips a mutex-guarded flag when the process receives a
//! termination signal. Loops poll the flag only between iterations, so an
//! iteration already underway always finishes.

use std::sync::{Arc, Mutex};

/// Reports whether the worker has been asked to stop
pub trait Interrupt: Send + Sync {
    fn is_interrupted(&self) -> bool;
}

/// A shareable interrupt flag
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<Mutex<bool>>,
}

impl InterruptFlag {
    /// Creates a flag that is not yet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag
    pub fn interrupt(&self) {
        match self.flag.lock() {
            Ok(mut flag) => *flag = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
    }
}

impl Interrupt for InterruptFlag {
    fn is_interrupted(&self) -> bool {
        match self.flag.lock() {
            Ok(flag) => *flag,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Listens for termination signals in the background
pub struct InterruptWatcher;

impl InterruptWatcher {
    /// Spawns the listener and returns the flag it sets
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> InterruptFlag {
        let flag = InterruptFlag::new();
        let setter = flag.clone();

        tokio::spawn(async move {
            termination_signal().await;
            tracing::info!("Termination signal received, finishing current iteration");
            setter.interrupt();
        });

        flag
    }
}

#[cfg(unix)]
async fn termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
