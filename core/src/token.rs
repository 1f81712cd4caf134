//! Bearer token store and its persistence backends.
//!
//! # Design
//! `TokenStore` is a cloneable handle to one shared credential cell. It is
//! handed to `KehatiClient` at construction instead of living in a global,
//! so two clients only share a token when they share a store.
//!
//! Persistence goes through `TokenStorage`, a key-value medium addressed by
//! `TOKEN_KEY`. A store built with `memory_only` has no medium at all and
//! behaves as if persisted state never existed. Storage failures are logged
//! and swallowed: none of the store operations fail.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "auth_token";

/// A persistent key-value medium for client state.
pub trait TokenStorage: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// In-process storage. Clones share the same map, which lets tests model a
/// "reload" by building a second `TokenStore` over a clone.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Directory-backed storage: each key is a plain-text file named after it.
#[derive(Debug, Clone)]
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

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl TokenStorage for FileStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

struct Inner {
    token: RwLock<Option<String>>,
    storage: Option<Box<dyn TokenStorage>>,
}

/// Holder of the current bearer credential.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

impl TokenStore {
    /// Store mirrored to `storage`. Call `init` before issuing requests to
    /// pick up a token persisted by an earlier session.
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        Self::build(Some(Box::new(storage)))
    }

    /// Store without a persistent medium; the token lives only in memory.
    pub fn memory_only() -> Self {
        Self::build(None)
    }

    fn build(storage: Option<Box<dyn TokenStorage>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: RwLock::new(None),
                storage,
            }),
        }
    }

    /// Whether a persistent medium is attached.
    pub fn is_persistent(&self) -> bool {
        self.inner.storage.is_some()
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the credential. `None` (or an empty token) removes the
    /// persisted entry instead of writing it. Memory and storage are updated
    /// under one write lock so they never disagree.
    pub fn set(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        let mut current = self.inner.token.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(storage) = &self.inner.storage {
            let result = match &token {
                Some(t) => storage.save(TOKEN_KEY, t),
                None => storage.remove(TOKEN_KEY),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "token storage write failed; keeping token in memory only");
            }
        }
        tracing::debug!(present = token.is_some(), "token store updated");
        *current = token;
    }

    pub fn clear(&self) {
        self.set(None);
    }

    /// Load the persisted credential into memory. Without a medium the
    /// store is left empty.
    pub fn init(&self) {
        let Some(storage) = &self.inner.storage else {
            tracing::debug!("no token storage available; starting unauthenticated");
            return;
        };
        let mut current = self.inner.token.write().unwrap_or_else(PoisonError::into_inner);
        let loaded = match storage.load(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "token storage read failed; starting unauthenticated");
                None
            }
        };
        tracing::debug!(present = loaded.is_some(), "token store initialised");
        *current = loaded;
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::memory_only()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.get().is_some())
            .field("persistent", &self.is_persistent())
            .finish()
    }
}
