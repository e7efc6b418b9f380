pub mod conversations;
pub mod current;
pub mod state;

pub use conversations::ConversationStore;
pub use current::ActiveVersion;
pub use state::AppState;

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle to the application state. Cloning the handle shares the
/// state; guards must not be held across network calls.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<AppState>>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.inner.write().await
    }

    pub async fn snapshot(&self) -> AppState {
        self.inner.read().await.clone()
    }

    pub async fn is_streaming(&self) -> bool {
        self.inner.read().await.streaming
    }
}
