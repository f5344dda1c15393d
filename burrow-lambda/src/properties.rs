//! `FunctionProperties` (spec §3): the persisted, authoritative record of
//! one function. The in-memory `functions` map the manager keeps is a
//! cache over the metadata JSON file, not a second source of truth.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

pub fn validate_name(name: &str) -> Result<(), Error> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

pub fn validate_handler(handler: &str) -> Result<(), Error> {
    if handler.contains('.') && !handler.starts_with('.') && !handler.ends_with('.') {
        Ok(())
    } else {
        Err(Error::InvalidHandler(handler.to_string()))
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// The persisted record for one function, serialized verbatim to
/// `<metadata_dir>/<name>.metadata.json` (spec §6.5). `installed` tracks
/// only whether an installation currently exists — the installation
/// itself (worker process, leases) is in-memory-only runtime state kept
/// alongside this in the manager, never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionProperties {
    pub name: String,
    pub handler: String,
    pub src_zip_sha256: String,
    #[serde(default)]
    pub installed: bool,
}

impl FunctionProperties {
    pub fn code_sha256(&self) -> &str {
        &self.src_zip_sha256
    }

    pub fn zip_path(&self, zips_dir: &Path) -> PathBuf {
        zips_dir.join(format!("{}.zip", self.src_zip_sha256))
    }

    pub fn metadata_path(metadata_dir: &Path, name: &str) -> PathBuf {
        metadata_dir.join(format!("{name}.metadata.json"))
    }

    pub async fn load(metadata_dir: &Path, name: &str) -> Result<Option<Self>, Error> {
        let path = Self::metadata_path(metadata_dir, name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, metadata_dir: &Path) -> Result<(), Error> {
        let path = Self::metadata_path(metadata_dir, &self.name);
        let body = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    pub async fn remove(metadata_dir: &Path, name: &str) -> Result<(), Error> {
        match tokio::fs::remove_file(Self::metadata_path(metadata_dir, name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
