// autosave.rs - Periodic draft saving.
//
// The timer is an explicit lease: it exists while the controller holds it and
// is cancelled when the lease is dropped or the draft reaches a terminal
// phase. The task only holds a weak reference to the controller state, so an
// abandoned controller is never kept alive by its own timer.

use std::sync::Weak;
use std::time::Duration;

use ap_draft::UserId;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::controller::Shared;
use crate::error::LifecycleError;

/// Handle to a running autosave task. Dropping it stops the task.
#[derive(Debug)]
pub struct AutosaveLease {
    handle: JoinHandle<()>,
    period: Duration,
}

impl AutosaveLease {
    pub(crate) fn spawn(
        shared: Weak<Shared>,
        user: UserId,
        period: Duration,
    ) -> Result<Self, LifecycleError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LifecycleError::AutosaveUnavailable(e.to_string()))?;

        let handle = runtime.spawn(async move {
            // First save one full period after start, not immediately.
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                if !shared.autosave_tick(user).await {
                    tracing::debug!("draft is terminal; autosave finished");
                    break;
                }
            }
        });

        Ok(Self { handle, period })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutosaveLease {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_outside_runtime_is_unavailable() {
        let result = AutosaveLease::spawn(Weak::new(), 1, Duration::from_secs(1));
        assert!(matches!(result, Err(LifecycleError::AutosaveUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn task_ends_when_controller_is_gone() {
        let lease = AutosaveLease::spawn(Weak::new(), 1, Duration::from_secs(5)).unwrap();
        assert!(lease.is_running());
        time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        assert!(!lease.is_running());
    }

    #[tokio::test]
    async fn dropping_the_lease_aborts() {
        let lease = AutosaveLease::spawn(Weak::new(), 1, Duration::from_secs(3600)).unwrap();
        assert_eq!(lease.period(), Duration::from_secs(3600));
        drop(lease);
    }
}
