//! # Model Lifecycle Handle
//!
//! Explicitly owned handle around an injected backend, tracking whether the
//! underlying model is usable. The orchestrator consults the handle before
//! every call and degrades gracefully when the model is not ready, instead of
//! reaching into implicit global model state.

use crate::backend::{Backend, BackendError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Lifecycle states of a managed model backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    /// Not yet loaded; calls degrade
    Unloaded,
    /// Load in progress
    Loading,
    /// Loaded and serving
    Ready,
    /// Load attempted and failed
    Failed,
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Dependency-injected model handle with a load/unload lifecycle
pub struct ModelHandle<T: ?Sized> {
    backend: Arc<T>,
    state: RwLock<ModelState>,
}

impl<T: ?Sized> fmt::Debug for ModelHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized + Backend> ModelHandle<T> {
    /// Wrap a backend that still needs loading
    pub fn new(backend: Arc<T>) -> Self {
        Self {
            backend,
            state: RwLock::new(ModelState::Unloaded),
        }
    }

    /// Wrap a backend that is usable immediately
    pub fn ready(backend: Arc<T>) -> Self {
        Self {
            backend,
            state: RwLock::new(ModelState::Ready),
        }
    }

    pub fn state(&self) -> ModelState {
        *self.state.read()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Backend identifier, available in every lifecycle state
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The backend, gated on readiness. Returns `None` unless the model is
    /// `Ready`, so callers cannot invoke an unloaded backend by accident.
    pub fn get(&self) -> Option<Arc<T>> {
        if self.is_ready() {
            Some(self.backend.clone())
        } else {
            None
        }
    }

    /// Drive the backend through its load sequence.
    ///
    /// Already-ready handles return immediately. A load already in progress
    /// is reported as unavailable rather than started twice.
    pub async fn load(&self) -> Result<(), BackendError> {
        {
            let mut state = self.state.write();
            match *state {
                ModelState::Ready => return Ok(()),
                ModelState::Loading => {
                    return Err(BackendError::Unavailable(format!(
                        "{} load already in progress",
                        self.backend.name()
                    )));
                }
                ModelState::Unloaded | ModelState::Failed => {
                    *state = ModelState::Loading;
                }
            }
        }

        match self.backend.load().await {
            Ok(()) => {
                *self.state.write() = ModelState::Ready;
                info!(backend = self.backend.name(), "🟢 Model backend loaded");
                Ok(())
            }
            Err(e) => {
                *self.state.write() = ModelState::Failed;
                error!(backend = self.backend.name(), error = %e, "❌ Model backend load failed");
                Err(e)
            }
        }
    }

    /// Release the model; subsequent calls degrade until the next `load`
    pub fn unload(&self) {
        *self.state.write() = ModelState::Unloaded;
        info!(backend = self.backend.name(), "Model backend unloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubBackend {
        fail_load: AtomicBool,
    }

    impl StubBackend {
        fn new(fail_load: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_load: AtomicBool::new(fail_load),
            })
        }
    }

    #[async_trait::async_trait]
    impl Backend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        async fn load(&self) -> Result<(), BackendError> {
            if self.fail_load.load(Ordering::SeqCst) {
                Err(BackendError::Transient("load failed".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_load_transitions_to_ready() {
        let handle = ModelHandle::new(StubBackend::new(false));
        assert_eq!(handle.state(), ModelState::Unloaded);
        assert!(handle.get().is_none());

        handle.load().await.unwrap();
        assert_eq!(handle.state(), ModelState::Ready);
        assert!(handle.get().is_some());
    }

    #[tokio::test]
    async fn test_failed_load_transitions_to_failed() {
        let handle = ModelHandle::new(StubBackend::new(true));

        let result = handle.load().await;
        assert!(result.is_err());
        assert_eq!(handle.state(), ModelState::Failed);
        assert!(handle.get().is_none());
    }

    #[tokio::test]
    async fn test_failed_handle_can_retry_load() {
        let backend = StubBackend::new(true);
        let handle = ModelHandle::new(backend.clone());

        let _ = handle.load().await;
        assert_eq!(handle.state(), ModelState::Failed);

        backend.fail_load.store(false, Ordering::SeqCst);
        handle.load().await.unwrap();
        assert_eq!(handle.state(), ModelState::Ready);
    }

    #[tokio::test]
    async fn test_unload_returns_to_unloaded() {
        let handle = ModelHandle::ready(StubBackend::new(false));
        assert!(handle.is_ready());

        handle.unload();
        assert_eq!(handle.state(), ModelState::Unloaded);
        assert!(handle.get().is_none());
    }

    #[tokio::test]
    async fn test_ready_constructor_skips_load() {
        let handle = ModelHandle::ready(StubBackend::new(true));
        // Load on a ready handle is a no-op, the failing backend is not called
        handle.load().await.unwrap();
        assert!(handle.is_ready());
    }
}
