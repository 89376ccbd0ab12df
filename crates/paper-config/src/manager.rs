//! Configuration manager
//!
//! Single owner of the live configuration. Every change produces a new
//! immutable snapshot which is persisted, published on a watch channel and
//! handed to each registered listener synchronously.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;

use paper_core::{PaperResult, UnifiedConfig};
use paper_wire::OscValue;

use crate::{apply_command, ConfigStore};

/// Callback invoked with every published snapshot
pub type ConfigListener = Arc<dyn Fn(&Arc<UnifiedConfig>) + Send + Sync>;

/// Owner of the live configuration snapshot
pub struct ConfigManager {
    store: Box<dyn ConfigStore>,
    current: RwLock<Arc<UnifiedConfig>>,
    sender: watch::Sender<Arc<UnifiedConfig>>,
    listeners: RwLock<Vec<ConfigListener>>,
    /// Serializes read-modify-write cycles
    update_lock: Mutex<()>,
}

impl ConfigManager {
    /// Create a manager holding the default configuration
    pub fn new(store: Box<dyn ConfigStore>) -> Self {
        let initial = Arc::new(UnifiedConfig::default());
        let (sender, _) = watch::channel(initial.clone());
        ConfigManager {
            store,
            current: RwLock::new(initial),
            sender,
            listeners: RwLock::new(Vec::new()),
            update_lock: Mutex::new(()),
        }
    }

    /// Current snapshot
    pub fn config(&self) -> Arc<UnifiedConfig> {
        self.current.read().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<UnifiedConfig>> {
        self.sender.subscribe()
    }

    /// Register a synchronous listener
    pub fn register_listener<F>(&self, listener: F)
    where
        F: Fn(&Arc<UnifiedConfig>) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Load the persisted document.
    ///
    /// A missing document is created from the current snapshot. An
    /// undecodable one is replaced by defaults. Only a successful load
    /// notifies.
    pub fn load(&self) {
        let _guard = self.update_lock.lock();
        let location = self.store.describe(crate::UNIFIED_CONFIG_FILE);

        match self.store.load() {
            Ok(Some(config)) => {
                tracing::info!("Loading config from {}", location);
                self.publish(Arc::new(config));
            }
            Ok(None) => {
                tracing::info!("Config file did not exist, creating one at {}", location);
                self.persist(&self.config());
            }
            Err(e) => {
                tracing::error!("Config decoding failed ({}), overwriting with defaults", e);
                let defaults = Arc::new(UnifiedConfig::default());
                *self.current.write() = defaults.clone();
                self.persist(&defaults);
            }
        }
    }

    /// Save the current snapshot
    pub fn save(&self) -> PaperResult<()> {
        let config = self.config();
        tracing::info!("Saving config at {}", self.store.describe(crate::UNIFIED_CONFIG_FILE));
        self.store.save(&config)
    }

    /// Replace the whole configuration
    pub fn update_config(&self, config: UnifiedConfig) {
        let _guard = self.update_lock.lock();
        let config = Arc::new(config);
        self.persist(&config);
        self.publish(config);
    }

    /// Apply a `/command/set/<field>` mutation.
    ///
    /// Unknown fields and values of the wrong type are reported and leave the
    /// configuration untouched. The document is written before returning; on a
    /// multi-threaded runtime the write runs under `block_in_place`.
    pub fn apply_command(&self, osc_field: &str, value: &OscValue) -> PaperResult<Arc<UnifiedConfig>> {
        let _guard = self.update_lock.lock();

        let (next, described) = apply_command(&self.config(), osc_field, value)?;
        tracing::info!("[UPDATE] updating field {} to {}", osc_field, described);

        let next = Arc::new(next);
        self.persist(&next);
        self.publish(next.clone());
        Ok(next)
    }

    /// Fold legacy single-purpose documents into the unified one.
    ///
    /// Returns whether anything was migrated. Failures are logged and skipped.
    pub fn migrate_legacy(&self) -> bool {
        let _guard = self.update_lock.lock();
        let mut config = (*self.config()).clone();
        let mut migrated = false;

        match self.store.load_legacy_face() {
            Ok(Some(face)) => {
                config.face_tracking = face;
                tracing::info!("Migrated PaperTracker configuration");
                migrated = true;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to migrate PaperTracker configuration: {}", e),
        }

        match self.store.load_legacy_eye() {
            Ok(Some(eye)) => {
                config.eye_tracking = eye;
                tracing::info!("Migrated ETVR configuration");
                migrated = true;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to migrate ETVR configuration: {}", e),
        }

        if migrated {
            let config = Arc::new(config);
            *self.current.write() = config.clone();
            self.persist(&config);
        }
        migrated
    }

    fn persist(&self, config: &UnifiedConfig) {
        tracing::debug!("Saving config at {}", self.store.describe(crate::UNIFIED_CONFIG_FILE));
        let save = || self.store.save(config);
        let result = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(save)
            }
            _ => save(),
        };
        if let Err(e) = result {
            tracing::error!("Failed to save config: {}", e);
        }
    }

    fn publish(&self, config: Arc<UnifiedConfig>) {
        *self.current.write() = config.clone();
        self.sender.send_replace(config.clone());

        // Listeners may read the manager; call them without holding the list lock
        let listeners: Vec<ConfigListener> = self.listeners.read().clone();
        for listener in listeners {
            listener(&config);
        }
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("config", &self.config())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonFileStore, MemoryStore, LEGACY_EYE_CONFIG_FILE, LEGACY_FACE_CONFIG_FILE, UNIFIED_CONFIG_FILE};
    use paper_core::PaperError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(manager: &ConfigManager) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        manager.register_listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_load_missing_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(Box::new(JsonFileStore::new(dir.path())));
        let count = counting(&manager);

        manager.load();
        assert!(dir.path().join(UNIFIED_CONFIG_FILE).exists());
        assert_eq!(*manager.config(), UnifiedConfig::default());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_existing_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut saved = UnifiedConfig::default();
        saved.face_tracking.face_port = 9100;
        store.save(&saved).unwrap();

        let manager = ConfigManager::new(Box::new(store));
        let count = counting(&manager);
        manager.load();

        assert_eq!(manager.config().face_tracking.face_port, 9100);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_corrupt_resets_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(UNIFIED_CONFIG_FILE), "[1, 2").unwrap();

        let manager = ConfigManager::new(Box::new(JsonFileStore::new(dir.path())));
        manager.load();

        assert_eq!(*manager.config(), UnifiedConfig::default());
        let contents = std::fs::read_to_string(dir.path().join(UNIFIED_CONFIG_FILE)).unwrap();
        let reparsed: UnifiedConfig = serde_json::from_str(&contents).unwrap();
        assert_eq!(reparsed, UnifiedConfig::default());
    }

    #[test]
    fn test_apply_command_persists_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(Box::new(JsonFileStore::new(dir.path())));
        let count = counting(&manager);
        let mut rx = manager.subscribe();

        manager
            .apply_command("gui_WidenThresholdV1_min", &OscValue::Float(0.3))
            .unwrap();
        manager
            .apply_command("gui_WidenThresholdV1_max", &OscValue::Float(0.9))
            .unwrap();

        assert_eq!(manager.config().eye_tracking.widen_threshold_v1(), [0.3, 0.9]);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().eye_tracking.widen_threshold_v1(), [0.3, 0.9]);

        let on_disk = JsonFileStore::new(dir.path()).load().unwrap().unwrap();
        assert_eq!(on_disk.eye_tracking.widen_threshold_v1(), [0.3, 0.9]);
    }

    #[test]
    fn test_rejected_command_changes_nothing() {
        let store = MemoryStore::new();
        let manager = ConfigManager::new(Box::new(store));
        let count = counting(&manager);
        let before = manager.config();

        let result = manager.apply_command("gui_Unknown", &OscValue::Float(1.0));
        assert!(matches!(result, Err(PaperError::UnknownConfigField(_))));
        let result = manager.apply_command("gui_OutputMultiplier", &OscValue::Bool(true));
        assert!(result.is_err());

        assert!(Arc::ptr_eq(&before, &manager.config()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let manager = ConfigManager::new(Box::new(MemoryStore::new()));
        let old = manager.config();
        manager
            .apply_command("gui_VRCFTModulePort", &OscValue::Integer(9500))
            .unwrap();
        assert_eq!(old.eye_tracking.port_number, 8889);
        assert_eq!(manager.config().eye_tracking.port_number, 9500);
    }

    #[test]
    fn test_listener_may_read_manager() {
        let manager = Arc::new(ConfigManager::new(Box::new(MemoryStore::new())));
        let seen = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&manager);
        let s = seen.clone();
        manager.register_listener(move |config| {
            if let Some(m) = weak.upgrade() {
                assert_eq!(m.config().eye_tracking.port_number, config.eye_tracking.port_number);
                s.fetch_add(1, Ordering::SeqCst);
            }
        });

        manager
            .apply_command("gui_VRCFTModulePort", &OscValue::Integer(9600))
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_migrate_legacy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(LEGACY_FACE_CONFIG_FILE),
            r#"{"FaceHost":"192.168.1.5","FacePort":9001}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(LEGACY_EYE_CONFIG_FILE), "not json").unwrap();

        let manager = ConfigManager::new(Box::new(JsonFileStore::new(dir.path())));
        assert!(manager.migrate_legacy());
        assert_eq!(manager.config().face_tracking.face_host, "192.168.1.5");
        assert_eq!(manager.config().eye_tracking.port_number, 8889);

        manager.load();
        assert_eq!(manager.config().face_tracking.face_port, 9001);
    }

    #[test]
    fn test_migrate_nothing() {
        let manager = ConfigManager::new(Box::new(MemoryStore::new()));
        assert!(!manager.migrate_legacy());
    }

    #[test]
    fn test_update_config() {
        let manager = ConfigManager::new(Box::new(MemoryStore::new()));
        let count = counting(&manager);
        let mut config = UnifiedConfig::default();
        config.enable_face_tracking = false;
        manager.update_config(config);

        assert!(!manager.config().enable_face_tracking);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        manager.save().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_apply_command_on_worker_thread_persists() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(ConfigManager::new(Box::new(JsonFileStore::new(dir.path()))));

        let worker = manager.clone();
        tokio::spawn(async move {
            worker
                .apply_command("gui_VRCFTModulePort", &OscValue::Float(9123.0))
                .unwrap();
        })
        .await
        .unwrap();

        let on_disk = JsonFileStore::new(dir.path()).load().unwrap().unwrap();
        assert_eq!(on_disk.eye_tracking.port_number, 9123);
    }

    #[tokio::test]
    async fn test_apply_command_on_current_thread_persists() {
        let store = Arc::new(MemoryStore::new());
        let manager = ConfigManager::new(Box::new(store.clone()));

        manager
            .apply_command("gui_ShouldEmulateEyebrows", &OscValue::Bool(true))
            .unwrap();

        assert!(store.load().unwrap().unwrap().eye_tracking.should_emulate_eyebrows);
    }
}
