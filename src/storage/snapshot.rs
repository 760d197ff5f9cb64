//! Snapshot-persisted store.
//!
//! Keeps the index in a [`MemoryStore`] and writes the whole table to a single
//! file on [`SnapshotStore::flush`], or automatically every
//! `auto_snapshot_ops` mutations. A snapshot atomically replaces the previous
//! one (temp file + rename).
//!
//! File layout: magic, one version byte, then the sorted entries encoded with
//! `bincode`.

use super::{MemoryStore, Store, Values};
use crate::error::{GeohashError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const SNAPSHOT_MAGIC: &[u8] = b"GEOHASH_SNAPSHOT";
const SNAPSHOT_VERSION: u8 = 1;

#[derive(Debug, Clone, Default)]
pub struct SnapshotConfig {
    /// Flush automatically after this many mutations.
    pub auto_snapshot_ops: Option<usize>,
}

/// A [`MemoryStore`] persisted to a snapshot file.
pub struct SnapshotStore {
    memory: MemoryStore,
    path: PathBuf,
    config: SnapshotConfig,
    ops_since_snapshot: Mutex<usize>,
}

impl SnapshotStore {
    /// Opens the snapshot at `path`, starting empty when the file is absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, SnapshotConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: SnapshotConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let memory = MemoryStore::new();
        let entries = load(&path)?;
        log::debug!(
            "Loaded {} entries from snapshot {}",
            entries.len(),
            path.display()
        );
        memory.replace_all(entries);

        Ok(Self {
            memory,
            path,
            config,
            ops_since_snapshot: Mutex::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current content to disk.
    pub fn flush(&self) -> Result<()> {
        let mut ops = self.ops_since_snapshot.lock();
        self.save()?;
        *ops = 0;
        Ok(())
    }

    fn record_operation(&self) -> Result<()> {
        let mut ops = self.ops_since_snapshot.lock();
        *ops += 1;
        if let Some(threshold) = self.config.auto_snapshot_ops
            && *ops >= threshold
        {
            self.save()?;
            *ops = 0;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let entries: Vec<(Bytes, Values)> = self.memory.entries().into_iter().collect();
        let temp_path = self.temp_path();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_all(&[SNAPSHOT_VERSION])?;
        bincode::serialize_into(&mut writer, &entries)?;

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;
        log::debug!(
            "Wrote snapshot of {} entries to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let mut new_name = name.to_string_lossy().into_owned();
            new_name.push_str(".tmp");
            temp.set_file_name(new_name);
        }
        temp
    }
}

fn load(path: &Path) -> Result<Vec<(Bytes, Values)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }

    let mut reader = BufReader::new(file);

    let mut magic = vec![0u8; SNAPSHOT_MAGIC.len()];
    reader.read_exact(&mut magic)?;
    if magic != SNAPSHOT_MAGIC {
        return Err(GeohashError::InvalidFormat);
    }

    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != SNAPSHOT_VERSION {
        return Err(GeohashError::InvalidFormat);
    }

    Ok(bincode::deserialize_from(&mut reader)?)
}

impl Store for SnapshotStore {
    fn contains(&self, key: &[u8]) -> Result<bool> {
        self.memory.contains(key)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Values>> {
        self.memory.get(key)
    }

    fn set(&self, key: &[u8], values: Values) -> Result<()> {
        self.memory.set(key, values)?;
        self.record_operation()
    }

    fn delete(&self, key: &[u8]) -> Result<Option<Values>> {
        let old = self.memory.delete(key)?;
        self.record_operation()?;
        Ok(old)
    }

    fn keys(&self) -> Result<Vec<Bytes>> {
        self.memory.keys()
    }

    fn len(&self) -> Result<usize> {
        self.memory.len()
    }

    fn get_many(&self, keys: &[Bytes]) -> Result<Vec<Option<Values>>> {
        self.memory.get_many(keys)
    }

    /// Applies the whole batch before counting it as one mutation, so an
    /// automatic snapshot never captures half of it.
    fn set_many(&self, entries: Vec<(Bytes, Values)>) -> Result<()> {
        self.memory.set_many(entries)?;
        self.record_operation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.snapshot");

        let store = SnapshotStore::open(&path).unwrap();
        store
            .set(b"u09tv", vec![Bytes::from("a"), Bytes::from("b")])
            .unwrap();
        store.set(b"ezs42", Vec::new()).unwrap();
        store.flush().unwrap();

        let reopened = SnapshotStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        assert_eq!(
            reopened.get(b"u09tv").unwrap(),
            Some(vec![Bytes::from("a"), Bytes::from("b")])
        );
        assert_eq!(reopened.get(b"ezs42").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_auto_snapshot_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auto.snapshot");
        let config = SnapshotConfig {
            auto_snapshot_ops: Some(3),
        };

        let store = SnapshotStore::open_with_config(&path, config).unwrap();
        store.set(b"a", vec![Bytes::from("1")]).unwrap();
        store.set(b"b", vec![Bytes::from("2")]).unwrap();
        assert!(!path.exists());

        store.set(b"c", vec![Bytes::from("3")]).unwrap();
        assert!(path.exists());
        assert_eq!(SnapshotStore::open(&path).unwrap().len().unwrap(), 3);
    }

    #[test]
    fn test_batch_counts_as_one_operation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.snapshot");
        let config = SnapshotConfig {
            auto_snapshot_ops: Some(2),
        };

        let store = SnapshotStore::open_with_config(&path, config).unwrap();
        store
            .set_many(vec![
                (Bytes::from_static(b"a"), vec![Bytes::from("1")]),
                (Bytes::from_static(b"b"), vec![Bytes::from("2")]),
                (Bytes::from_static(b"c"), vec![Bytes::from("3")]),
            ])
            .unwrap();
        assert!(!path.exists());

        store
            .set_many(vec![(Bytes::from_static(b"d"), vec![Bytes::from("4")])])
            .unwrap();
        assert_eq!(SnapshotStore::open(&path).unwrap().len().unwrap(), 4);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("missing.snapshot")).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_invalid_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.snapshot");

        let mut file = File::create(&path).unwrap();
        file.write_all(b"INVALID_MAGIC_HEADER").unwrap();
        file.sync_all().unwrap();
        drop(file);

        assert!(matches!(
            SnapshotStore::open(&path),
            Err(GeohashError::InvalidFormat)
        ));
    }
}
