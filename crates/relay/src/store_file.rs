//! JSON file-backed registry store with atomic writes.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    tokio::{fs, io::AsyncWriteExt},
    tracing::{debug, info, warn},
};

use crate::{Error, Result, registry::RegistryDocument, store::RegistryStore};

/// Registry document stored as pretty-printed JSON in a single file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic write: write and sync `<path>.tmp`, copy the current file to
    /// `<path>.bak`, then rename the temp file over the target. A crash at any
    /// point leaves either the old or the new document in place.
    async fn atomic_write(&self, doc: &RegistryDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            if let Err(e) = fs::copy(&self.path, &bak).await {
                warn!(path = %bak.display(), error = %e, "failed to back up registry document");
            }
        }

        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "registry document saved");
        Ok(())
    }
}

#[async_trait]
impl RegistryStore for FileStore {
    async fn load(&self) -> Result<RegistryDocument> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!(path = %self.path.display(), "no registry document, creating an empty one");
            let doc = RegistryDocument::default();
            self.atomic_write(&doc).await?;
            return Ok(doc);
        }
        let data = fs::read(&self.path).await?;
        serde_json::from_slice(&data).map_err(|source| Error::StorageCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, doc: &RegistryDocument) -> Result<()> {
        self.atomic_write(doc).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, guildlink_common::Snowflake, serde_json::json, tempfile::TempDir};

    fn make_store(dir: &Path) -> FileStore {
        FileStore::new(dir.join("data").join("storage.json"))
    }

    #[tokio::test]
    async fn load_missing_creates_empty_document() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());

        let doc = store.load().await.unwrap();
        assert_eq!(doc, RegistryDocument::default());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());

        let mut doc = RegistryDocument::default();
        doc.channels.insert("100".into(), Snowflake::new(10));
        doc.banned_words.push("spam".into());
        store.save(&doc).await.unwrap();

        assert_eq!(store.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn save_of_load_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            serde_json::to_string_pretty(&json!({
                "channels": { "100": 10, "200": 20 },
                "blacklist": [7],
                "bannedWords": ["spam", "scam"],
                "log": { "guild_id": 1, "channel_id": 2 },
                "guilds": { "custom": true }
            }))
            .unwrap(),
        )
        .unwrap();

        let first = store.load().await.unwrap();
        store.save(&first).await.unwrap();
        let written = std::fs::read_to_string(store.path()).unwrap();
        store.save(&store.load().await.unwrap()).await.unwrap();

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), written);
        assert_eq!(store.load().await.unwrap(), first);
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::StorageCorrupt { .. }), "{err}");
        assert!(err.to_string().contains("storage.json"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), [b'{', 0xff, 0xfe, b'}']).unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::StorageCorrupt { .. }), "{err}");
        assert!(err.to_string().contains("storage.json"));
    }

    #[tokio::test]
    async fn wrong_schema_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{ "channels": ["not", "a", "map"] }"#).unwrap();

        assert!(matches!(
            store.load().await,
            Err(Error::StorageCorrupt { .. })
        ));
    }

    #[tokio::test]
    async fn backup_kept_and_no_temp_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());

        store.save(&RegistryDocument::default()).await.unwrap();
        let mut doc = RegistryDocument::default();
        doc.channels.insert("100".into(), Snowflake::new(10));
        store.save(&doc).await.unwrap();

        let dir = store.path().parent().unwrap();
        assert!(dir.join("storage.json.bak").exists());
        assert!(!dir.join("storage.json.tmp").exists());

        let bak: RegistryDocument =
            serde_json::from_str(&std::fs::read_to_string(dir.join("storage.json.bak")).unwrap())
                .unwrap();
        assert!(bak.channels.is_empty());
    }
}
