//! Persisted "viewed" flags, keyed by listing id.
//!
//! The whole map is one JSON object stored under [`STORAGE_KEY`].  Storage
//! trouble never reaches the caller: a corrupt or unreadable blob starts an
//! empty map, and failed writes are logged while the in-memory map keeps
//! working for the rest of the session.
//!
//! Ids of listings that have since disappeared stay in the map; nothing
//! prunes them.

use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Key the viewed map is stored under.
pub const STORAGE_KEY: &str = "san-do-cu:viewed";

/// Byte storage addressed by key.
pub trait Storage {
    /// Read the value for `key`, or `None` if nothing was ever written.
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace the value for `key`.
    fn write(&mut self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// One JSON file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `san-do-cu:viewed` → `<dir>/san-do-cu_viewed.json`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)
    }
}

/// In-memory storage for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Vec<u8>>,
    writes: usize,
    fail_writes: bool,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `key`, as if a previous session had written it.
    pub fn with_entry(mut self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(key.to_string(), bytes.into());
        self
    }

    /// Make every subsequent write fail, like a full or read-only disk.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "storage unavailable"));
        }
        self.entries.insert(key.to_string(), bytes.to_vec());
        self.writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The viewed map plus the storage it persists to.
pub struct ViewedStore<S: Storage> {
    storage: S,
    map: BTreeMap<String, bool>,
}

impl<S: Storage> ViewedStore<S> {
    /// Load the persisted map, falling back to an empty one.
    pub fn open(storage: S) -> Self {
        let map: BTreeMap<String, bool> = match storage.read(STORAGE_KEY) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(error = %e, "viewed state is corrupt, starting empty");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "could not read viewed state, starting empty");
                BTreeMap::new()
            }
        };
        debug!(entries = map.len(), "viewed state loaded");
        Self { storage, map }
    }

    pub fn is_viewed(&self, id: &str) -> bool {
        self.map.get(id).copied().unwrap_or(false)
    }

    /// Set one flag and persist. Empty ids are ignored.
    pub fn set_viewed(&mut self, id: &str, value: bool) {
        if id.is_empty() {
            return;
        }
        self.map.insert(id.to_string(), value);
        self.persist();
    }

    /// Flip one flag and persist. Returns the new value.
    pub fn toggle(&mut self, id: &str) -> bool {
        let value = !self.is_viewed(id);
        self.set_viewed(id, value);
        value
    }

    /// Set many flags with a single write. Empty ids are skipped.
    pub fn set_viewed_many<I>(&mut self, ids: I, value: bool)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            if !id.is_empty() {
                self.map.insert(id.to_string(), value);
            }
        }
        self.persist();
    }

    /// Forget every flag.
    pub fn clear(&mut self) {
        self.map.clear();
        self.persist();
    }

    /// Record unseen ids as not viewed, without writing.
    pub fn seed<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            if !id.is_empty() && !self.map.contains_key(id) {
                self.map.insert(id.to_string(), false);
            }
        }
    }

    /// Number of ids currently marked viewed.
    pub fn viewed_count(&self) -> usize {
        self.map.values().filter(|&&v| v).count()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) {
        let bytes = match serde_json::to_vec(&self.map) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "could not serialise viewed state");
                return;
            }
        };
        if let Err(e) = self.storage.write(STORAGE_KEY, &bytes) {
            warn!(error = %e, "could not persist viewed state");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
