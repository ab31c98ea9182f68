//! JSON file backend with atomic writes.
//!
//! Documents live under `dirs::data_dir()/<namespace>/<key>.json` and are
//! replaced via temp file + rename so a crash never leaves a half-written
//! document behind.

use crate::GateError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Document `<key>.json` under `dirs::data_dir()/<namespace>/`.
    pub fn in_data_dir(namespace: &str, key: &str) -> Result<Self, GateError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| GateError::storage("Could not find data directory"))?;

        Self::in_dir(base_dir.join(namespace), key)
    }

    /// Document `<key>.json` under `dir`, creating the directory if needed.
    pub fn in_dir(dir: PathBuf, key: &str) -> Result<Self, GateError> {
        fs::create_dir_all(&dir)
            .map_err(|e| GateError::storage(format!("Failed to create storage dir: {}", e)))?;

        Ok(Self {
            path: dir.join(format!("{}.json", key)),
        })
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path a corrupt document is moved to.
    pub fn corrupt_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    fn read(&self) -> Result<Option<String>, GateError> {
        if !self.path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| GateError::storage(format!("Failed to read {}: {}", self.path.display(), e)))
    }

    /// Load and parse the document, or `None` if it does not exist yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, GateError> {
        let Some(json) = self.read()? else {
            return Ok(None);
        };

        let value = serde_json::from_str(&json).map_err(|e| {
            GateError::storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(value))
    }

    /// Load the document, moving it to [`corrupt_path`](Self::corrupt_path)
    /// and returning `None` when it does not parse.
    ///
    /// Read errors still fail; only unparseable content is set aside.
    pub fn load_or_set_aside<T: DeserializeOwned>(&self) -> Result<Option<T>, GateError> {
        let Some(json) = self.read()? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(parse_error) => {
                let aside = self.corrupt_path();
                fs::rename(&self.path, &aside).map_err(|e| {
                    GateError::storage(format!(
                        "Failed to move corrupt {} aside: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %parse_error,
                    "corrupt document set aside, starting empty"
                );
                Ok(None)
            }
        }
    }

    /// Serialize and atomically replace the document.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), GateError> {
        let json = serde_json::to_string(value)
            .map_err(|e| GateError::storage(format!("Failed to serialize: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, &json)
            .map_err(|e| GateError::storage(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| GateError::storage(format!("Failed to replace document: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::in_dir(dir.path().to_path_buf(), "doc").unwrap();

        let loaded: Option<BTreeMap<String, Vec<String>>> = file.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::in_dir(dir.path().to_path_buf(), "doc").unwrap();

        let mut doc = BTreeMap::new();
        doc.insert("alice".to_string(), vec!["staff".to_string()]);
        file.save(&doc).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        assert_eq!(raw, r#"{"alice":["staff"]}"#);

        let loaded: BTreeMap<String, Vec<String>> = file.load().unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_save_replaces_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::in_dir(dir.path().to_path_buf(), "doc").unwrap();

        file.save(&vec![1, 2]).unwrap();
        file.save(&vec![3]).unwrap();

        let loaded: Vec<i32> = file.load().unwrap().unwrap();
        assert_eq!(loaded, vec![3]);

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corrupt_document_is_error() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::in_dir(dir.path().to_path_buf(), "doc").unwrap();
        fs::write(file.path(), "{not json").unwrap();

        let result: Result<Option<Vec<i32>>, _> = file.load();
        assert!(matches!(result, Err(GateError::Persistence { instance: None, .. })));
    }

    #[test]
    fn test_corrupt_document_set_aside() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::in_dir(dir.path().to_path_buf(), "doc").unwrap();
        fs::write(file.path(), "{not json").unwrap();

        let loaded: Option<Vec<i32>> = file.load_or_set_aside().unwrap();
        assert!(loaded.is_none());
        assert!(!file.path().exists());
        assert_eq!(fs::read_to_string(file.corrupt_path()).unwrap(), "{not json");
    }

    #[test]
    fn test_set_aside_keeps_valid_document() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::in_dir(dir.path().to_path_buf(), "doc").unwrap();
        file.save(&vec![7]).unwrap();

        let loaded: Option<Vec<i32>> = file.load_or_set_aside().unwrap();
        assert_eq!(loaded, Some(vec![7]));
        assert!(!file.corrupt_path().exists());
    }

    #[test]
    fn test_creates_nested_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let file = JsonFile::in_dir(nested.clone(), "doc").unwrap();

        assert!(nested.is_dir());
        assert_eq!(file.path(), nested.join("doc.json"));
    }
}
