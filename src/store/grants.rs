//! Locally recorded grants: username -> unlocked instance names.
//!
//! The whole mapping is one JSON object stored under [`STORAGE_KEY`]. It is
//! read fully on open and rewritten fully on every addition. Grants are only
//! ever added; resetting them is an external, manual operation.

use crate::store::file::JsonFile;
use crate::GateError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

/// Fixed storage key of the grant mapping.
pub const STORAGE_KEY: &str = "userAccessCodes";

type GrantBook = BTreeMap<String, Vec<String>>;

/// Instances unlocked for one username.
///
/// Names are unique and kept in the order they were granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    username: String,
    instance_names: Vec<String>,
}

impl Grant {
    /// An empty grant for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            instance_names: Vec::new(),
        }
    }

    fn from_names(username: &str, names: &[String]) -> Self {
        let mut grant = Self::new(username);
        for name in names {
            grant.insert(name);
        }
        grant
    }

    /// Owner of the grant.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Unlocked instance names in grant order.
    pub fn instance_names(&self) -> &[String] {
        &self.instance_names
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, instance_name: &str) -> bool {
        self.instance_names.iter().any(|n| n == instance_name)
    }

    /// Add an instance name. Returns `false` if it was already present.
    pub fn insert(&mut self, instance_name: &str) -> bool {
        if self.contains(instance_name) {
            return false;
        }
        self.instance_names.push(instance_name.to_string());
        true
    }

    /// Whether nothing has been granted.
    pub fn is_empty(&self) -> bool {
        self.instance_names.is_empty()
    }
}

/// Persisted grant mapping.
///
/// All reads and writes go through one lock; the in-memory copy only changes
/// after the file write succeeded.
pub struct GrantStore {
    file: JsonFile,
    book: Mutex<GrantBook>,
}

impl GrantStore {
    /// Open the store under `dirs::data_dir()/<namespace>/`.
    ///
    /// A grant file that does not parse is moved to
    /// `userAccessCodes.json.corrupt` and the store starts empty.
    pub fn open(namespace: &str) -> Result<Self, GateError> {
        Self::from_file(JsonFile::in_data_dir(namespace, STORAGE_KEY)?)
    }

    /// Open the store in an explicit directory.
    pub fn at_dir(dir: PathBuf) -> Result<Self, GateError> {
        Self::from_file(JsonFile::in_dir(dir, STORAGE_KEY)?)
    }

    fn from_file(file: JsonFile) -> Result<Self, GateError> {
        let stored: GrantBook = file.load_or_set_aside()?.unwrap_or_default();

        // Normalize externally edited files that contain duplicates.
        let book = stored
            .iter()
            .map(|(user, names)| {
                let grant = Grant::from_names(user, names);
                (user.clone(), grant.instance_names)
            })
            .collect::<GrantBook>();

        debug!(path = %file.path().display(), users = book.len(), "grant store loaded");

        Ok(Self {
            file,
            book: Mutex::new(book),
        })
    }

    /// Snapshot of the grant for `username` (empty if none).
    pub fn grant_for(&self, username: &str) -> Grant {
        let book = self.book.lock().unwrap_or_else(|e| e.into_inner());
        match book.get(username) {
            Some(names) => Grant::from_names(username, names),
            None => Grant::new(username),
        }
    }

    /// Record `instance_name` for `username` and persist the whole mapping.
    ///
    /// Idempotent: returns `Ok(false)` without writing when already present.
    ///
    /// # Errors
    /// `Persistence` with `instance` set when the write fails.
    pub fn add_grant(&self, username: &str, instance_name: &str) -> Result<bool, GateError> {
        let mut book = self.book.lock().unwrap_or_else(|e| e.into_inner());

        let current = book.get(username).map(Vec::as_slice).unwrap_or_default();
        let mut grant = Grant::from_names(username, current);
        if !grant.insert(instance_name) {
            debug!(username = %username, instance = %instance_name, "grant already recorded");
            return Ok(false);
        }

        let mut updated = book.clone();
        updated.insert(username.to_string(), grant.instance_names);

        self.file
            .save(&updated)
            .map_err(|e| GateError::Persistence {
                instance: Some(instance_name.to_string()),
                reason: e.to_string(),
            })?;

        *book = updated;
        info!(username = %username, instance = %instance_name, "grant recorded");
        Ok(true)
    }

    /// Usernames with at least one grant.
    pub fn usernames(&self) -> Vec<String> {
        let book = self.book.lock().unwrap_or_else(|e| e.into_inner());
        book.keys().cloned().collect()
    }
}
