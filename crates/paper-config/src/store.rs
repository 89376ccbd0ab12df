//! Configuration persistence
//!
//! A store reads and writes named JSON documents. The manager only talks to
//! the [`ConfigStore`] trait, so the tracking core never touches the disk
//! itself.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use paper_core::{EyeTrackingConfig, FaceTrackingConfig, PaperError, PaperResult, UnifiedConfig};

/// Unified configuration document
pub const UNIFIED_CONFIG_FILE: &str = "UnifiedTrackerConfig.json";

/// Legacy face tracker document, migrated into the face block
pub const LEGACY_FACE_CONFIG_FILE: &str = "PaperTrackerConfig.json";

/// Legacy eye tracker document, migrated into the eye block
pub const LEGACY_EYE_CONFIG_FILE: &str = "ETVRModuleConfig.json";

/// Named-document storage
pub trait ConfigStore: Send + Sync {
    /// Raw contents of a document, `None` if it does not exist
    fn read_document(&self, name: &str) -> PaperResult<Option<String>>;

    /// Replace a document
    fn write_document(&self, name: &str, contents: &str) -> PaperResult<()>;

    /// Human-readable location, for logs
    fn describe(&self, name: &str) -> String;

    /// Load the unified document
    fn load(&self) -> PaperResult<Option<UnifiedConfig>> {
        decode_document(self, UNIFIED_CONFIG_FILE)
    }

    /// Save the unified document, pretty-printed
    fn save(&self, config: &UnifiedConfig) -> PaperResult<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| PaperError::ConfigDecode(e.to_string()))?;
        self.write_document(UNIFIED_CONFIG_FILE, &json)
    }

    fn load_legacy_face(&self) -> PaperResult<Option<FaceTrackingConfig>> {
        decode_document(self, LEGACY_FACE_CONFIG_FILE)
    }

    fn load_legacy_eye(&self) -> PaperResult<Option<EyeTrackingConfig>> {
        decode_document(self, LEGACY_EYE_CONFIG_FILE)
    }
}

fn decode_document<S, T>(store: &S, name: &str) -> PaperResult<Option<T>>
where
    S: ConfigStore + ?Sized,
    T: DeserializeOwned,
{
    match store.read_document(name)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| PaperError::ConfigDecode(format!("{}: {}", name, e))),
        None => Ok(None),
    }
}

impl<S: ConfigStore + ?Sized> ConfigStore for Arc<S> {
    fn read_document(&self, name: &str) -> PaperResult<Option<String>> {
        (**self).read_document(name)
    }

    fn write_document(&self, name: &str, contents: &str) -> PaperResult<()> {
        (**self).write_document(name, contents)
    }

    fn describe(&self, name: &str) -> String {
        (**self).describe(name)
    }
}

/// Documents stored as files in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl ConfigStore for JsonFileStore {
    fn read_document(&self, name: &str) -> PaperResult<Option<String>> {
        match fs::read_to_string(self.path_of(name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PaperError::ConfigIo(format!("{}: {}", self.describe(name), e))),
        }
    }

    fn write_document(&self, name: &str, contents: &str) -> PaperResult<()> {
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(self.path_of(name), contents))
            .map_err(|e| PaperError::ConfigIo(format!("{}: {}", self.describe(name), e)))
    }

    fn describe(&self, name: &str) -> String {
        self.path_of(name).display().to_string()
    }
}

/// Documents held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document
    pub fn with_document(self, name: &str, contents: &str) -> Self {
        self.documents
            .lock()
            .insert(name.to_string(), contents.to_string());
        self
    }

    pub fn document(&self, name: &str) -> Option<String> {
        self.documents.lock().get(name).cloned()
    }
}

impl ConfigStore for MemoryStore {
    fn read_document(&self, name: &str) -> PaperResult<Option<String>> {
        Ok(self.document(name))
    }

    fn write_document(&self, name: &str, contents: &str) -> PaperResult<()> {
        self.documents
            .lock()
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }

    fn describe(&self, name: &str) -> String {
        format!("memory:{}", name)
    }
}
