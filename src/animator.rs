//! Timer driving the phase animation.
//!
//! The animator owns at most one recurring task. Starting always cancels the
//! previous task first, and dropping the animator cancels it too, so no tick
//! outlives the view that owns it.

use std::sync::PoisonError;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::session::SharedSession;

pub use cartoquartier_core::animator::DEFAULT_INTERVAL;

pub struct PhaseAnimator {
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl Default for PhaseAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl PhaseAnimator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start ticking. The current phase filter is left as is until the first
    /// tick, one interval from now. Must be called within a tokio runtime.
    pub fn start(&mut self, session: SharedSession) {
        self.stop();

        let period = self.interval;
        tracing::debug!(?period, "phase animation started");
        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let phase = session
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .advance_phase();
                tracing::trace!(%phase, "phase tick");
            }
        }));
    }

    /// Stop ticking. The phase filter keeps its last value. Returns whether a
    /// task was running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("phase animation stopped");
                true
            }
            None => false,
        }
    }

    /// Start if stopped, stop if running. Returns the new running state.
    pub fn toggle(&mut self, session: SharedSession) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start(session);
            true
        }
    }
}

impl Drop for PhaseAnimator {
    fn drop(&mut self) {
        self.stop();
    }
}
