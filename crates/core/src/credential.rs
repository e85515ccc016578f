//! Session credential and the stores that hold it.
//!
//! The credential is the only persisted state. It is read before every
//! content fetch and written only when a login poll reaches `Done`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{BiliError, Result};

/// Cookie values that authenticate requests against the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "SESSDATA", default)]
    pub session_token: String,
    #[serde(rename = "BILI_JCT", default)]
    pub cross_site_token: String,
    #[serde(rename = "BUVID3", default)]
    pub device_id: String,
}

impl Credential {
    pub fn new(
        session_token: impl Into<String>, cross_site_token: impl Into<String>, device_id: impl Into<String>,
    ) -> Self {
        Self {
            session_token: session_token.into(),
            cross_site_token: cross_site_token.into(),
            device_id: device_id.into(),
        }
    }

    /// A credential without a session token cannot authenticate anything.
    pub fn is_empty(&self) -> bool {
        self.session_token.is_empty()
    }

    /// Renders the `Cookie` request header value, skipping empty parts.
    pub fn cookie_header(&self) -> String {
        [
            ("SESSDATA", &self.session_token),
            ("bili_jct", &self.cross_site_token),
            ("buvid3", &self.device_id),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
    }
}

/// Load/save contract for the single credential record.
///
/// A missing or unreadable record is the normal "not logged in" state, so
/// `load` returns `None` rather than an error.
pub trait CredentialStore {
    fn load(&self) -> Option<Credential>;
    fn save(&self, credential: &Credential) -> Result<()>;
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/bilicard/cookies.json`, falling back to the working
    /// directory when the platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("bilicard"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cookies.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credential> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Credential>(&raw) {
            Ok(credential) if !credential.is_empty() => Some(credential),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed credential file");
                None
            }
        }
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string(credential).map_err(|e| BiliError::Credential(e.to_string()))?;
        fs::write(&self.path, encoded)?;
        tracing::info!(path = %self.path.display(), "credential saved");
        Ok(())
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
    saves: Mutex<usize>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self { slot: Mutex::new(Some(credential)), saves: Mutex::new(0) }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|e| BiliError::Credential(e.to_string()))?;
        *slot = Some(credential.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for &S {
    fn load(&self) -> Option<Credential> {
        (**self).load()
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        (**self).save(credential)
    }
}
