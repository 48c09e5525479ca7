use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use fruitlink_core::domain::chat::View;
use fruitlink_db::AppStore;

/// Switches the session view after a delay. Scheduling again replaces the
/// pending switch; dropping the navigator cancels it.
pub struct DelayedNavigator {
    store: AppStore,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedNavigator {
    pub fn new(store: AppStore, delay: Duration) -> Self {
        Self { store, delay, pending: Mutex::new(None) }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, view: View) {
        let store = self.store.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.navigate(view).await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            if !previous.is_finished() {
                debug!(event_name = "agent.navigation.replaced", "pending navigation replaced");
            }
            previous.abort();
        }
    }

    /// Returns `true` if a navigation was still waiting.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DelayedNavigator {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
