//! Host-facing tracking module
//!
//! The host calls `initialize` once, `update` every tick and `teardown` at
//! exit. The module owns its own Tokio runtime so the host thread never needs
//! one; receive tasks and the restart supervisor run on its workers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Runtime;

use paper_config::{ConfigManager, ConfigStore, JsonFileStore};
use paper_core::{PaperError, PaperResult, UnifiedTrackingData};
use paper_tracking::{EyeTrackingEngine, ExpressionRouter};

use crate::osc::{OscManager, SharedEyeEngine, SharedExpressionRouter};

/// Upper bound on runtime shutdown at teardown
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Eye and face tracking module
pub struct TrackingModule {
    store: Option<Arc<dyn ConfigStore>>,
    runtime: Option<Runtime>,
    config: Option<Arc<ConfigManager>>,
    eye: Option<SharedEyeEngine>,
    face: Option<SharedExpressionRouter>,
    osc: Option<Arc<OscManager>>,
}

impl TrackingModule {
    /// Module whose configuration lives in the directory given to `initialize`
    pub fn new() -> Self {
        TrackingModule {
            store: None,
            runtime: None,
            config: None,
            eye: None,
            face: None,
            osc: None,
        }
    }

    /// Module backed by an explicit store; `initialize` ignores its directory.
    ///
    /// The store is kept across re-initialization.
    pub fn with_store(store: Box<dyn ConfigStore>) -> Self {
        let mut module = Self::new();
        module.store = Some(Arc::from(store));
        module
    }

    /// Load configuration, build the engines and start listening.
    ///
    /// An engine is built only when the host offers it and its channel is
    /// enabled in the loaded configuration. Returns `(eye, expression)`: which
    /// engines were built. With neither built no listener is started. A
    /// listener that fails to bind does not fail initialization; it shows up
    /// as [`OscState::Error`](crate::OscState::Error).
    pub fn initialize(
        &mut self,
        config_dir: impl AsRef<Path>,
        eye_available: bool,
        expression_available: bool,
    ) -> (bool, bool) {
        match self.try_initialize(config_dir.as_ref(), eye_available, expression_available) {
            Ok(built) => built,
            Err(e) => {
                tracing::error!("Tracking module failed to initialize: {}", e);
                (false, false)
            }
        }
    }

    fn try_initialize(
        &mut self,
        config_dir: &Path,
        eye_available: bool,
        expression_available: bool,
    ) -> PaperResult<(bool, bool)> {
        self.teardown();

        let store: Box<dyn ConfigStore> = match &self.store {
            Some(store) => Box::new(store.clone()),
            None => Box::new(JsonFileStore::new(config_dir)),
        };
        let config = Arc::new(ConfigManager::new(store));
        if config.migrate_legacy() {
            tracing::info!("Legacy configuration migrated");
        }
        config.load();
        let snapshot = config.config();

        let eye = (snapshot.enable_eye_tracking && eye_available)
            .then(|| Arc::new(Mutex::new(EyeTrackingEngine::new(&snapshot.eye_tracking))));
        let face = (snapshot.enable_face_tracking && expression_available)
            .then(|| Arc::new(Mutex::new(ExpressionRouter::new())));

        if eye.is_none() && face.is_none() {
            tracing::warn!("No tracking channel is both available and enabled");
            self.config = Some(config);
            return Ok((false, false));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("paper-osc")
            .enable_all()
            .build()
            .map_err(|e| PaperError::TransportError(e.to_string()))?;

        let osc = Arc::new(OscManager::new(config.clone(), eye.clone(), face.clone()));
        runtime.block_on(async {
            osc.start().await;
            osc.spawn_supervisor()
        })?;

        tracing::info!(
            "Tracking module initialized (eye: {}, expression: {}, osc: {})",
            eye.is_some(),
            face.is_some(),
            osc.state()
        );

        let built = (eye.is_some(), face.is_some());
        self.runtime = Some(runtime);
        self.config = Some(config);
        self.eye = eye;
        self.face = face;
        self.osc = Some(osc);
        Ok(built)
    }

    /// Per-tick pull: eye data first, then expression weights
    pub fn update(&self, output: &mut UnifiedTrackingData) {
        if let Some(eye) = &self.eye {
            eye.lock().update(output);
        }
        if let Some(face) = &self.face {
            face.lock().update_expression_data(output);
        }
    }

    /// Stop listeners and the runtime. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let (Some(runtime), Some(osc)) = (&self.runtime, &self.osc) {
            runtime.block_on(osc.shutdown());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
            tracing::info!("Tracking module torn down");
        }
        self.osc = None;
        self.eye = None;
        self.face = None;
        self.config = None;
    }

    pub fn config(&self) -> Option<&Arc<ConfigManager>> {
        self.config.as_ref()
    }

    pub fn eye_engine(&self) -> Option<&SharedEyeEngine> {
        self.eye.as_ref()
    }

    pub fn face_router(&self) -> Option<&SharedExpressionRouter> {
        self.face.as_ref()
    }

    pub fn osc(&self) -> Option<&Arc<OscManager>> {
        self.osc.as_ref()
    }
}

impl Default for TrackingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TrackingModule {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
