//! File-backed slot store.
//!
//! One record file per gallery slot under a configured directory. Stands in
//! for the device's flash partition; anything byte-addressable that honors
//! the [`SlotStore`] contract can replace it.

use anyhow::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::hardware::SlotStore;

pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("slot{slot:02}.bin"))
    }
}

#[async_trait]
impl SlotStore for FsStore {
    async fn read(&self, slot: usize) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.slot_path(slot)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, slot: usize, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.slot_path(slot), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_slot_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path());
        assert_eq!(store.read(3).await.expect("read"), None);
    }

    #[tokio::test]
    async fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path());
        store.write(0, &[1, 2, 3]).await.expect("write");
        assert_eq!(store.read(0).await.expect("read"), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn empty_record_marks_slot_unused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path());
        store.write(1, &[9]).await.expect("write");
        store.write(1, &[]).await.expect("erase");
        assert_eq!(store.read(1).await.expect("read"), Some(Vec::new()));
    }
}
