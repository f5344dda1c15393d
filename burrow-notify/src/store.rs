//! Per-bucket notification configuration persistence (spec §4.8, §6.5):
//! `<object_base>/<base64(bucket_name)>.xml`, written atomically on update,
//! loaded lazily at first access and cached thereafter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use tokio::sync::RwLock;

use crate::config::NotificationConfig;
use crate::Error;

pub struct ConfigStore {
    object_base: PathBuf,
    cache: RwLock<HashMap<String, Arc<NotificationConfig>>>,
}

impl ConfigStore {
    pub fn new(object_base: impl Into<PathBuf>) -> Self {
        Self {
            object_base: object_base.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path_for(&self, bucket: &str) -> PathBuf {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bucket);
        self.object_base.join(format!("{encoded}.xml"))
    }

    /// Loads `bucket`'s configuration, defaulting to an empty one if no
    /// file has been written for it yet.
    pub async fn load(&self, bucket: &str) -> Result<Arc<NotificationConfig>, Error> {
        if let Some(cfg) = self.cache.read().await.get(bucket) {
            return Ok(cfg.clone());
        }
        let mut guard = self.cache.write().await;
        if let Some(cfg) = guard.get(bucket) {
            return Ok(cfg.clone());
        }
        let path = self.path_for(bucket);
        let cfg = match tokio::fs::read_to_string(&path).await {
            Ok(body) => NotificationConfig::parse(&body)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => NotificationConfig::empty(),
            Err(e) => return Err(e.into()),
        };
        let cfg = Arc::new(cfg);
        guard.insert(bucket.to_string(), cfg.clone());
        Ok(cfg)
    }

    /// Parses, validates, and atomically persists `xml_body` as `bucket`'s
    /// new configuration.
    pub async fn put(&self, bucket: &str, xml_body: &str) -> Result<(), Error> {
        let cfg = NotificationConfig::parse(xml_body)?;
        let path = self.path_for(bucket);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_atomically(&path, &cfg.to_xml_string()?).await?;
        self.cache.write().await.insert(bucket.to_string(), Arc::new(cfg));
        Ok(())
    }
}

async fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("xml.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_of_unconfigured_bucket_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let cfg = store.load("never-configured").await.unwrap();
        let event = crate::event::ObjectEvent::put("never-configured", "k", 1);
        assert_eq!(cfg.matching_handlers(&event).count(), 0);
    }

    #[tokio::test]
    async fn put_then_load_persists_across_cache_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let xml = r#"<NotificationConfiguration>
  <CloudFunctionConfiguration>
    <CloudFunction>arn:aws:lambda:function:f</CloudFunction>
    <Event>s3:ObjectCreated:Put</Event>
  </CloudFunctionConfiguration>
</NotificationConfiguration>"#;
        store.put("mybucket", xml).await.unwrap();

        // simulate a fresh process: new store, same directory
        let reopened = ConfigStore::new(dir.path());
        let cfg = reopened.load("mybucket").await.unwrap();
        let event = crate::event::ObjectEvent::put("mybucket", "k", 1);
        assert_eq!(cfg.matching_handlers(&event).count(), 1);
    }
}
