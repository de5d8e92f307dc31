//! Durable storage for the active endpoint and endpoint history
//!
//! The stored endpoint is the source of truth for the initial connection on
//! startup; the history feeds the endpoint picker. Both are sanitized on
//! every read: entries are normalized, deduplicated, and truncated, so a
//! stale or hand-edited file never leaks junk into the running system.
//!
//! `FileStore` keeps both values in one JSON document in the platform app
//! data directory, written atomically (temp file, then rename). Writers are
//! expected to be a single supervising manager, so there is no cross-process
//! locking here.

use crate::endpoint::{normalize_endpoint, sanitize_history};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const STORE_FILE: &str = "endpoints.json";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct EndpointDocument {
    endpoint: Option<String>,
    #[serde(default)]
    history: Vec<String>,
}

/// Durable key/value storage for endpoint state
pub trait EndpointStore: Send + Sync {
    /// Last-used endpoint, normalized; `None` on first run
    fn load_endpoint(&self) -> io::Result<Option<String>>;
    fn store_endpoint(&self, endpoint: &str) -> io::Result<()>;

    /// Endpoint history, sanitized (normalized, deduped, capped)
    fn load_history(&self) -> io::Result<Vec<String>>;
    fn store_history(&self, history: &[String]) -> io::Result<()>;
}

/// JSON-file-backed endpoint store
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store under the platform app data directory
    pub fn new_default() -> io::Result<Self> {
        let proj = ProjectDirs::from("com", "webrpc", "webrpc-dashboard").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "unable to resolve app data dir")
        })?;
        Self::new_in_dir(proj.data_local_dir())
    }

    /// Store under an explicit directory (created if missing)
    pub fn new_in_dir(path: impl AsRef<Path>) -> io::Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    fn read_document(&self) -> io::Result<EndpointDocument> {
        let path = self.path();
        if !path.exists() {
            return Ok(EndpointDocument::default());
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse {STORE_FILE}: {err}"),
            )
        })
    }

    fn write_document(&self, document: &EndpointDocument) -> io::Result<()> {
        let path = self.path();
        let tmp = path.with_extension("tmp");
        let payload = serde_json::to_string_pretty(document)
            .map_err(|err| io::Error::other(format!("serialize {STORE_FILE}: {err}")))?;
        fs::write(&tmp, payload)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

impl EndpointStore for FileStore {
    fn load_endpoint(&self) -> io::Result<Option<String>> {
        let document = self.read_document()?;
        Ok(document.endpoint.as_deref().and_then(normalize_endpoint))
    }

    fn store_endpoint(&self, endpoint: &str) -> io::Result<()> {
        let mut document = self.read_document().unwrap_or_default();
        document.endpoint = Some(endpoint.to_string());
        self.write_document(&document)
    }

    fn load_history(&self) -> io::Result<Vec<String>> {
        let document = self.read_document()?;
        Ok(sanitize_history(&document.history))
    }

    fn store_history(&self, history: &[String]) -> io::Result<()> {
        let mut document = self.read_document().unwrap_or_default();
        document.history = history.to_vec();
        self.write_document(&document)
    }
}

/// In-memory endpoint store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<EndpointDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with an endpoint, as if from a previous run
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().endpoint = Some(endpoint.into());
        store
    }
}

impl EndpointStore for MemoryStore {
    fn load_endpoint(&self) -> io::Result<Option<String>> {
        let document = self.inner.lock().unwrap();
        Ok(document.endpoint.as_deref().and_then(normalize_endpoint))
    }

    fn store_endpoint(&self, endpoint: &str) -> io::Result<()> {
        self.inner.lock().unwrap().endpoint = Some(endpoint.to_string());
        Ok(())
    }

    fn load_history(&self) -> io::Result<Vec<String>> {
        let document = self.inner.lock().unwrap();
        Ok(sanitize_history(&document.history))
    }

    fn store_history(&self, history: &[String]) -> io::Result<()> {
        self.inner.lock().unwrap().history = history.to_vec();
        Ok(())
    }
}
