//! Snapshot persistence over a per-tab key-value storage

use crate::Result;
use crate::constants::SNAPSHOT_SCHEMA_VERSION;
use crate::content::BlockContent;
use crate::error::SheetError;
use crate::settings::Settings;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace, warn};

/// Storage key for the serialized settings
pub const SETTINGS_KEY: &str = "settings";

/// Storage key for the serialized block contents
pub const CONTENTS_KEY: &str = "contents";

/// Storage key for the snapshot schema version
pub const SCHEMA_KEY: &str = "schemaVersion";

/// String key-value storage scoped to one editing session
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Remove every entry
    fn clear(&mut self) -> Result<()>;
}

/// In-memory storage, lost when dropped like a browser tab's session storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

/// Directory-backed storage holding one `<key>.json` file per entry
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open a storage directory, creating it when missing
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("Opened file storage at {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Replace the entry atomically through a temporary file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let owned = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(".json") || name.ends_with(".json.tmp"));
            if owned {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Settings and block contents as restored from storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedSnapshot {
    pub settings: Settings,
    pub contents: BlockContent,
}

/// Load and save whole sheet snapshots
pub trait SnapshotStore {
    /// Read the last snapshot, or None when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedSnapshot>>;

    /// Overwrite the stored snapshot in full
    fn save(&mut self, settings: &Settings, contents: &BlockContent) -> Result<()>;

    /// Forget the stored snapshot
    fn clear(&mut self) -> Result<()>;
}

/// Snapshot store writing `settings`, `contents` and `schemaVersion` entries
#[derive(Debug, Clone, Default)]
pub struct KeyValueSnapshotStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> KeyValueSnapshotStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Put entries back as they were before a failed save, newest first
    fn restore(&mut self, entries: impl Iterator<Item = (&'static str, Option<String>)>) {
        let entries: Vec<_> = entries.collect();
        for (key, value) in entries.into_iter().rev() {
            let restored = match value {
                Some(value) => self.storage.set(key, &value),
                None => self.storage.remove(key),
            };
            if let Err(e) = restored {
                warn!(key, "Could not restore snapshot entry: {e}");
            }
        }
    }

    /// Schema version of the stored entries; unversioned entries count as version 0
    fn schema_version(&self) -> Result<u32> {
        match self.storage.get(SCHEMA_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(0),
        }
    }
}

impl<S: KeyValueStorage> SnapshotStore for KeyValueSnapshotStore<S> {
    #[instrument(skip(self))]
    fn load(&self) -> Result<Option<PersistedSnapshot>> {
        let settings = self.storage.get(SETTINGS_KEY)?;
        let contents = self.storage.get(CONTENTS_KEY)?;
        if settings.is_none() && contents.is_none() {
            debug!("No stored snapshot");
            return Ok(None);
        }

        let version = self.schema_version()?;
        if version > SNAPSHOT_SCHEMA_VERSION {
            return Err(SheetError::UnsupportedSchema {
                found: version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        // Versions 0 and 1 share the same entry layout

        let settings = match settings {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Settings::default(),
        };
        let contents = match contents {
            Some(raw) => serde_json::from_str(&raw)?,
            None => BlockContent::default(),
        };
        trace!(version, entries = contents.len(), "Loaded snapshot");

        Ok(Some(PersistedSnapshot { settings, contents }))
    }

    fn save(&mut self, settings: &Settings, contents: &BlockContent) -> Result<()> {
        let entries = [
            (SCHEMA_KEY, SNAPSHOT_SCHEMA_VERSION.to_string()),
            (SETTINGS_KEY, serde_json::to_string(settings)?),
            (CONTENTS_KEY, serde_json::to_string(contents)?),
        ];
        let previous = entries
            .iter()
            .map(|(key, _)| self.storage.get(key))
            .collect::<Result<Vec<_>>>()?;

        for (written, (key, value)) in entries.iter().enumerate() {
            if let Err(e) = self.storage.set(key, value) {
                warn!(key = *key, "Snapshot write failed, restoring previous entries: {e}");
                let keys = entries.iter().map(|(key, _)| *key);
                self.restore(keys.zip(previous).take(written));
                return Err(e);
            }
        }
        trace!(
            bytes = entries.iter().map(|(_, value)| value.len()).sum::<usize>(),
            "Saved snapshot"
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        debug!("Clearing stored snapshot");
        self.storage.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BlockId;

    fn sample_contents() -> BlockContent {
        let mut contents = BlockContent::new();
        contents
            .set(BlockId::new(0, 1), "<p><em>hi</em> &amp; bye</p>", 100)
            .unwrap();
        contents.clear(BlockId::new(3, 0));
        contents
    }

    #[test]
    fn test_empty_storage_loads_nothing() {
        let store = KeyValueSnapshotStore::new(MemoryStorage::new());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut store = KeyValueSnapshotStore::new(MemoryStorage::new());
        let settings = Settings::with_blocks(11).font_size(9.0).line_height(1.35);
        let contents = sample_contents();
        store.save(&settings, &contents).unwrap();

        let snapshot = store.load().unwrap().unwrap();
        assert_eq!(snapshot.settings, settings);
        assert_eq!(snapshot.contents, contents);
        assert_eq!(store.storage().len(), 3);
    }

    #[test]
    fn test_round_trip_keeps_every_float_bit() {
        let mut store = KeyValueSnapshotStore::new(MemoryStorage::new());
        for font_size in [39.430133835633676, 0.1 + 0.2, 17.000000000000004, 6.02214076e-3] {
            let settings = Settings::default()
                .font_size(font_size)
                .line_height(font_size / 7.0)
                .letter_spacing(-font_size / 3.0);
            store.save(&settings, &BlockContent::new()).unwrap();

            let loaded = store.load().unwrap().unwrap().settings;
            assert_eq!(loaded.font_size_px.to_bits(), settings.font_size_px.to_bits());
            assert_eq!(loaded.line_height.to_bits(), settings.line_height.to_bits());
            assert_eq!(loaded.letter_spacing.to_bits(), settings.letter_spacing.to_bits());
        }
    }

    /// Storage whose writes to one key fail once armed
    #[derive(Debug, Default)]
    struct FailingKey {
        inner: MemoryStorage,
        fail_on: Option<&'static str>,
    }

    impl KeyValueStorage for FailingKey {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.fail_on == Some(key) {
                return Err(SheetError::Io(std::io::Error::other("quota exceeded")));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_failed_write_restores_earlier_entries() {
        let mut store = KeyValueSnapshotStore::new(FailingKey::default());
        let contents = sample_contents();
        store.save(&Settings::default(), &contents).unwrap();

        store.storage_mut().fail_on = Some(CONTENTS_KEY);
        let result = store.save(&Settings::with_blocks(12), &BlockContent::new());
        assert!(matches!(result, Err(SheetError::Io(_))));

        store.storage_mut().fail_on = None;
        let snapshot = store.load().unwrap().unwrap();
        assert_eq!(snapshot.settings, Settings::default());
        assert_eq!(snapshot.contents, contents);
    }

    #[test]
    fn test_failed_first_save_leaves_nothing_behind() {
        let mut store = KeyValueSnapshotStore::new(FailingKey {
            fail_on: Some(CONTENTS_KEY),
            ..Default::default()
        });
        assert!(store.save(&Settings::default(), &sample_contents()).is_err());
        assert!(store.storage().inner.is_empty());
    }

    #[test]
    fn test_writes_schema_version() {
        let mut store = KeyValueSnapshotStore::new(MemoryStorage::new());
        store
            .save(&Settings::default(), &BlockContent::default())
            .unwrap();
        assert_eq!(
            store.storage().get(SCHEMA_KEY).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_reads_unversioned_entries() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                SETTINGS_KEY,
                r#"{"blocks":4,"fontSize":6,"charSpacing":-60,"lineHeight":1}"#,
            )
            .unwrap();
        storage.set(CONTENTS_KEY, r#"{"0-0":"<p>x</p>"}"#).unwrap();

        let snapshot = KeyValueSnapshotStore::new(storage).load().unwrap().unwrap();
        assert_eq!(snapshot.settings.block_count, 4);
        assert_eq!(snapshot.contents.get(&BlockId::new(0, 0)), "<p>x</p>");
    }

    #[test]
    fn test_missing_contents_entry_defaults_to_empty() {
        let mut storage = MemoryStorage::new();
        storage
            .set(SETTINGS_KEY, &serde_json::to_string(&Settings::default()).unwrap())
            .unwrap();
        let snapshot = KeyValueSnapshotStore::new(storage).load().unwrap().unwrap();
        assert!(snapshot.contents.is_empty());
    }

    #[test]
    fn test_rejects_newer_schema() {
        let mut storage = MemoryStorage::new();
        storage.set(SCHEMA_KEY, "7").unwrap();
        storage.set(CONTENTS_KEY, "{}").unwrap();
        let result = KeyValueSnapshotStore::new(storage).load();
        assert!(matches!(
            result,
            Err(SheetError::UnsupportedSchema {
                found: 7,
                supported: 1
            })
        ));
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, "{not json").unwrap();
        let result = KeyValueSnapshotStore::new(storage).load();
        assert!(matches!(result, Err(SheetError::Serialization(_))));
    }

    #[test]
    fn test_clear_forgets_snapshot() {
        let mut store = KeyValueSnapshotStore::new(MemoryStorage::new());
        store.save(&Settings::default(), &sample_contents()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_blocks(12);
        let contents = sample_contents();

        {
            let mut store = KeyValueSnapshotStore::new(FileStorage::open(dir.path()).unwrap());
            store.save(&settings, &contents).unwrap();
        }

        let store = KeyValueSnapshotStore::new(FileStorage::open(dir.path()).unwrap());
        let snapshot = store.load().unwrap().unwrap();
        assert_eq!(snapshot.settings, settings);
        assert_eq!(snapshot.contents, contents);
        assert!(dir.path().join("settings.json").exists());
    }

    #[test]
    fn test_file_storage_missing_key_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("nested")).unwrap();
        assert!(storage.get("absent").unwrap().is_none());
        storage.remove("absent").unwrap();

        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        storage.clear().unwrap();
        assert!(storage.get("a").unwrap().is_none());
        assert!(storage.get("b").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_clear_removes_interrupted_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.set(SETTINGS_KEY, "{}").unwrap();
        fs::write(dir.path().join("contents.json.tmp"), "{\"0-0\":").unwrap();
        fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();

        storage.clear().unwrap();
        assert!(!dir.path().join("settings.json").exists());
        assert!(!dir.path().join("contents.json.tmp").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
