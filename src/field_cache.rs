//! Per-field form auto-save.
//!
//! Every keystroke in the support form is saved under a namespaced key
//! (`contact_<field>`) and restored on the next page load. A successful
//! submission clears the namespace. Drafts belong to one browser: each
//! session cookie gets its own store.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

use crate::errors::RakshitaError;

/// Longest accepted field name.
const MAX_FIELD_LEN: usize = 64;

/// Flat string key-value storage.
pub trait FieldStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&mut self, key: &str, value: &str) -> Result<(), RakshitaError>;

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&mut self, key: &str) -> Result<(), RakshitaError>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryFieldStore {
    entries: BTreeMap<String, String>,
}

impl FieldStore for MemoryFieldStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), RakshitaError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), RakshitaError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileFieldStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileFieldStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RakshitaError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("field cache at {} holds {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), RakshitaError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl FieldStore for FileFieldStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), RakshitaError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), RakshitaError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Namespaced view over a `FieldStore` for one form.
pub struct FieldCache {
    namespace: String,
    fields: Vec<String>,
    store: Box<dyn FieldStore>,
}

impl FieldCache {
    /// Cache `fields` of the form called `namespace`.
    #[must_use]
    pub fn new(namespace: &str, fields: &[&str], store: Box<dyn FieldStore>) -> Self {
        Self {
            namespace: namespace.to_string(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            store,
        }
    }

    /// Storage key for `field`.
    ///
    /// # Errors
    ///
    /// Returns an error if `field` is not one of this form's fields.
    pub fn key(&self, field: &str) -> Result<String, RakshitaError> {
        if field.is_empty()
            || field.len() > MAX_FIELD_LEN
            || !self.fields.iter().any(|f| f == field)
        {
            return Err(RakshitaError::InvalidFieldKey(field.to_string()));
        }
        Ok(format!("{}_{field}", self.namespace))
    }

    /// Save one field's current value.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields or if the store fails.
    pub fn save(&mut self, field: &str, value: &str) -> Result<(), RakshitaError> {
        let key = self.key(field)?;
        self.store.set(&key, value)
    }

    /// Every saved, non-empty field value, keyed by field name.
    #[must_use]
    pub fn restore(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|field| {
                let key = format!("{}_{field}", self.namespace);
                self.store
                    .get(&key)
                    .filter(|v| !v.is_empty())
                    .map(|v| (field.clone(), v))
            })
            .collect()
    }

    /// Forget every field of this form.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn clear(&mut self) -> Result<(), RakshitaError> {
        for field in &self.fields {
            let key = format!("{}_{field}", self.namespace);
            self.store.remove(&key)?;
        }
        Ok(())
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Cookie that ties a browser to its drafts.
pub const SESSION_COOKIE: &str = "rakshita_session";

const SESSION_ID_LEN: usize = 32;

/// Opaque browser session id: 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:032x}", rng.r#gen::<u128>()))
    }

    /// Accept only ids this server could have minted, so an id is always a
    /// safe file name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == SESSION_ID_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(s.to_string()))
    }

    /// Session id carried by a `Cookie` request header.
    #[must_use]
    pub fn from_cookie_header(header: &str) -> Option<Self> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Self::parse(value.trim()))
    }

    /// `Set-Cookie` value handing this id to the browser.
    #[must_use]
    pub fn set_cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where session drafts are kept.
#[derive(Debug, Clone)]
pub enum SessionBacking {
    Memory,
    /// One `<session>.json` file per session
    Directory(PathBuf),
}

/// One `FieldCache` per browser session, opened on first use.
pub struct FieldSessions {
    namespace: &'static str,
    fields: &'static [&'static str],
    backing: SessionBacking,
    caches: HashMap<SessionId, FieldCache>,
}

impl FieldSessions {
    #[must_use]
    pub fn new(
        namespace: &'static str,
        fields: &'static [&'static str],
        backing: SessionBacking,
    ) -> Self {
        Self {
            namespace,
            fields,
            backing,
            caches: HashMap::new(),
        }
    }

    /// The cache for `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session's file exists but cannot be read.
    pub fn cache(&mut self, session: &SessionId) -> Result<&mut FieldCache, RakshitaError> {
        match self.caches.entry(session.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let store: Box<dyn FieldStore> = match &self.backing {
                    SessionBacking::Memory => Box::new(MemoryFieldStore::default()),
                    SessionBacking::Directory(dir) => {
                        Box::new(FileFieldStore::open(dir.join(format!("{session}.json")))?)
                    }
                };
                debug!("opened field cache for a new session");
                Ok(entry.insert(FieldCache::new(self.namespace, self.fields, store)))
            }
        }
    }
}
