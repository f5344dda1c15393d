//! `FunctionManager` (spec §4.6): the function-service's in-memory registry
//! over `FunctionProperties`, backed by persisted metadata JSON and
//! zip-by-sha256 storage, with installation and invocation layered on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use crate::installation::{FunctionInstallation, InvokeOutcome};
use crate::properties::{self, FunctionProperties};
use crate::Error;

const WORKER_POOL_DEPTH: usize = 8;

/// Filesystem, process, and tuning layout the manager needs (spec §6.5,
/// §6.7). Mirrors `burrow_core::Config`'s relevant fields rather than
/// borrowing it directly, so this crate doesn't need to know about the
/// object-service-only fields `Config` also carries.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub metadata_dir: PathBuf,
    pub zips_dir: PathBuf,
    pub install_base: PathBuf,
    pub worker_host_bin: PathBuf,
    pub result_woof_count: usize,
    pub call_woof_el_size: usize,
    pub invocation_timeout_ms: u64,
}

impl ManagerConfig {
    pub fn from_core_config(config: &burrow_core::Config, worker_host_bin: PathBuf) -> Self {
        Self {
            metadata_dir: config.metadata_dir.clone(),
            zips_dir: config.zips_dir.clone(),
            install_base: config.install_base.clone(),
            worker_host_bin,
            result_woof_count: config.result_woof_count,
            call_woof_el_size: config.call_woof_el_size,
            invocation_timeout_ms: config.invocation_timeout_ms,
        }
    }
}

pub enum InvocationResult {
    Payload(Vec<u8>),
    TimedOut,
    Fired,
}

struct Entry {
    properties: FunctionProperties,
    // `Arc` so `invoke` can clone it out from under a brief map lock and
    // await the RPC with no manager-wide lock held (spec §4.6, §5).
    installation: Option<Arc<FunctionInstallation>>,
}

pub struct FunctionManager {
    config: ManagerConfig,
    functions: RwLock<HashMap<String, Entry>>,
    serialization_lock: Mutex<()>,
}

impl FunctionManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            functions: RwLock::new(HashMap::new()),
            serialization_lock: Mutex::new(()),
        }
    }

    #[instrument(skip(self, zip_bytes), fields(function = %name))]
    pub async fn create(&self, name: &str, handler: &str, zip_bytes: &[u8]) -> Result<FunctionProperties, Error> {
        properties::validate_name(name)?;
        properties::validate_handler(handler)?;

        let _guard = self.serialization_lock.lock().await;
        {
            let functions = self.functions.read().await;
            if functions.contains_key(name) {
                return Err(Error::AlreadyExists(name.to_string()));
            }
        }
        if FunctionProperties::load(&self.config.metadata_dir, name).await?.is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }

        let props = self.materialize_code(name, handler, zip_bytes).await?;

        let mut functions = self.functions.write().await;
        functions.insert(
            name.to_string(),
            Entry {
                properties: props.clone(),
                installation: None,
            },
        );
        Ok(props)
    }

    #[instrument(skip(self, zip_bytes), fields(function = %name))]
    pub async fn update_code(&self, name: &str, zip_bytes: &[u8]) -> Result<FunctionProperties, Error> {
        let _guard = self.serialization_lock.lock().await;
        let existing = self.get(name).await?;
        let handler = existing.handler.clone();

        // Cascade: an installation built from the old code is no longer
        // valid once the zip changes.
        self.teardown_installation(name).await?;

        let props = self.materialize_code(name, &handler, zip_bytes).await?;
        let mut functions = self.functions.write().await;
        functions.insert(
            name.to_string(),
            Entry {
                properties: props.clone(),
                installation: None,
            },
        );
        Ok(props)
    }

    async fn materialize_code(&self, name: &str, handler: &str, zip_bytes: &[u8]) -> Result<FunctionProperties, Error> {
        let sha256 = properties::sha256_hex(zip_bytes);
        tokio::fs::create_dir_all(&self.config.zips_dir).await?;
        let zip_path = self.config.zips_dir.join(format!("{sha256}.zip"));
        tokio::fs::write(&zip_path, zip_bytes).await?;

        let props = FunctionProperties {
            name: name.to_string(),
            handler: handler.to_string(),
            src_zip_sha256: sha256,
            installed: false,
        };
        tokio::fs::create_dir_all(&self.config.metadata_dir).await?;
        props.save(&self.config.metadata_dir).await?;
        Ok(props)
    }

    #[instrument(skip(self), fields(function = %name))]
    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        let _guard = self.serialization_lock.lock().await;
        self.teardown_installation(name).await?;
        FunctionProperties::remove(&self.config.metadata_dir, name).await?;
        self.functions.write().await.remove(name);
        Ok(())
    }

    async fn teardown_installation(&self, name: &str) -> Result<(), Error> {
        let installation = {
            let mut functions = self.functions.write().await;
            functions.get_mut(name).and_then(|e| e.installation.take())
        };
        if let Some(installation) = installation {
            // Any in-flight invocation holding its own clone of this `Arc`
            // is abandoned, not blocked on (spec §5 best-effort cancellation).
            installation.teardown().await?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(function = %name))]
    pub async fn get(&self, name: &str) -> Result<FunctionProperties, Error> {
        if let Some(entry) = self.functions.read().await.get(name) {
            return Ok(entry.properties.clone());
        }
        match FunctionProperties::load(&self.config.metadata_dir, name).await? {
            Some(props) => {
                self.functions.write().await.insert(
                    name.to_string(),
                    Entry {
                        properties: props.clone(),
                        installation: None,
                    },
                );
                Ok(props)
            }
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    /// Idempotent (spec §4.6): a second call while already installed is a
    /// no-op.
    #[instrument(skip(self), fields(function = %name))]
    pub async fn install(&self, name: &str) -> Result<(), Error> {
        let _guard = self.serialization_lock.lock().await;
        {
            let functions = self.functions.read().await;
            if functions.get(name).map(|e| e.installation.is_some()).unwrap_or(false) {
                return Ok(());
            }
        }

        let props = self.get(name).await?;
        let install_path = self.config.install_base.join(format!("{}-{}", props.name, props.src_zip_sha256));
        let zip_bytes = tokio::fs::read(props.zip_path(&self.config.zips_dir)).await?;

        let installation = FunctionInstallation::create(
            &props.name,
            install_path,
            &zip_bytes,
            &self.config.worker_host_bin,
            WORKER_POOL_DEPTH,
            self.config.result_woof_count,
            self.config.call_woof_el_size,
        )
        .await?;

        let mut installed_props = props;
        installed_props.installed = true;
        installed_props.save(&self.config.metadata_dir).await?;

        let mut functions = self.functions.write().await;
        functions.insert(
            name.to_string(),
            Entry {
                properties: installed_props,
                installation: Some(Arc::new(installation)),
            },
        );
        Ok(())
    }

    /// Tears down every live installation (spec §5: "process-wide SIGINT
    /// triggers graceful shutdown of the function manager"). In-flight
    /// invocations riding an installation being torn down are abandoned,
    /// matching the spec's stated best-effort cancellation.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let installations: Vec<Arc<FunctionInstallation>> = {
            let mut functions = self.functions.write().await;
            functions.values_mut().filter_map(|e| e.installation.take()).collect()
        };
        for installation in installations {
            if let Err(e) = installation.teardown().await {
                tracing::warn!(error = %e, "installation teardown failed during shutdown");
            }
        }
    }

    #[instrument(skip(self, payload), fields(function = %name))]
    pub async fn invoke(&self, name: &str, payload: &[u8], request_response: bool) -> Result<InvocationResult, Error> {
        self.install(name).await?;

        let props = self.get(name).await?;
        let metadata: Value = serde_json::to_value(&props)?;

        // Only the `Arc` clone is taken under the map lock; the lock is
        // dropped before the (potentially tens-of-seconds-long) RPC below,
        // so concurrent invocations of other functions — and of this one —
        // are never serialized behind it (spec §4.6, §5).
        let installation = {
            let functions = self.functions.read().await;
            let entry = functions.get(name).ok_or_else(|| Error::NotFound(name.to_string()))?;
            entry.installation.clone().ok_or_else(|| Error::NotFound(name.to_string()))?
        };

        let timeout = Duration::from_millis(self.config.invocation_timeout_ms);
        match installation
            .invoke(name, &metadata, payload, self.config.call_woof_el_size, request_response, timeout)
            .await?
        {
            InvokeOutcome::Result(bytes) => Ok(InvocationResult::Payload(bytes)),
            InvokeOutcome::TimedOut => Ok(InvocationResult::TimedOut),
            InvokeOutcome::Fired => Ok(InvocationResult::Fired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tmp: &tempfile::TempDir) -> ManagerConfig {
        ManagerConfig {
            metadata_dir: tmp.path().join("metadata"),
            zips_dir: tmp.path().join("zips"),
            install_base: tmp.path().join("installs"),
            worker_host_bin: PathBuf::from("/bin/true"),
            result_woof_count: 4,
            call_woof_el_size: 16 * 1024,
            invocation_timeout_ms: 30_000,
        }
    }

    #[tokio::test]
    async fn create_persists_metadata_and_rejects_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = FunctionManager::new(config(&tmp));

        let props = manager.create("greet", "index.handler", b"PK\x03\x04fake").await.unwrap();
        assert_eq!(props.name, "greet");
        assert!(!props.installed);

        let err = manager.create("greet", "index.handler", b"PK\x03\x04fake").await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_rejects_invalid_name_and_handler() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = FunctionManager::new(config(&tmp));

        assert!(matches!(
            manager.create("bad name", "index.handler", b"x").await.unwrap_err(),
            Error::InvalidName(_)
        ));
        assert!(matches!(
            manager.create("ok-name", "nodothandler", b"x").await.unwrap_err(),
            Error::InvalidHandler(_)
        ));
    }

    #[tokio::test]
    async fn get_loads_from_metadata_file_after_a_fresh_manager() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let manager = FunctionManager::new(cfg.clone());
        manager.create("greet", "index.handler", b"zip-bytes").await.unwrap();

        let reloaded = FunctionManager::new(cfg);
        let props = reloaded.get("greet").await.unwrap();
        assert_eq!(props.handler, "index.handler");
    }

    #[tokio::test]
    async fn delete_removes_metadata_and_map_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = FunctionManager::new(config(&tmp));
        manager.create("greet", "index.handler", b"zip-bytes").await.unwrap();

        manager.delete("greet").await.unwrap();
        assert!(matches!(manager.get("greet").await.unwrap_err(), Error::NotFound(_)));
    }

    // Spec §8 invariant 3: create;delete;create succeeds for a valid name,
    // and a second create without an intervening delete conflicts.
    #[tokio::test]
    async fn create_delete_create_cycle_succeeds_and_a_bare_second_create_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = FunctionManager::new(config(&tmp));

        manager.create("greet", "index.handler", b"v1").await.unwrap();
        manager.delete("greet").await.unwrap();
        let recreated = manager.create("greet", "index.handler", b"v2").await.unwrap();
        assert_eq!(recreated.name, "greet");

        assert!(matches!(
            manager.create("greet", "index.handler", b"v3").await.unwrap_err(),
            Error::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn update_code_replaces_sha_and_clears_installed_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = FunctionManager::new(config(&tmp));
        let first = manager.create("greet", "index.handler", b"v1").await.unwrap();

        let second = manager.update_code("greet", b"v2").await.unwrap();
        assert_ne!(first.src_zip_sha256, second.src_zip_sha256);
        assert!(!second.installed);
    }
}
