//! Directory layer: fixed-width entry slots within one directory cluster
//!
//! A directory occupies exactly one cluster, which caps its children at
//! `cluster_size / entry_size - 2` (two slots go to `.` and `..`).

use zapfs_core::{DirectoryEntry, Error, Result};

use crate::volume::Volume;

impl Volume {
    /// Occupied slots of the directory cluster at `dir_address`, in slot order
    ///
    /// `.` and `..` are included.
    pub(crate) fn list_entries(&mut self, dir_address: u32) -> Result<Vec<DirectoryEntry>> {
        let cluster_size = self.sb()?.cluster_size as usize;
        let cluster = self.pipeline.read_at(dir_address as u64, cluster_size)?;

        let mut entries = Vec::new();
        for slot in cluster.chunks_exact(DirectoryEntry::SIZE) {
            let entry = DirectoryEntry::from_bytes(slot)?;
            if !entry.is_empty_slot() {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Entry named `name` in the directory cluster at `dir_address`
    pub(crate) fn find_entry(
        &mut self,
        dir_address: u32,
        name: &str,
    ) -> Result<Option<DirectoryEntry>> {
        Ok(self
            .list_entries(dir_address)?
            .into_iter()
            .find(|entry| entry.name == name))
    }

    /// Write `entry` into the first empty slot of the directory cluster
    ///
    /// # Errors
    ///
    /// Fails with the out-of-space error when every slot is occupied.
    pub(crate) fn append_entry(&mut self, dir_address: u32, entry: &DirectoryEntry) -> Result<()> {
        let cluster_size = self.sb()?.cluster_size as usize;
        let cluster = self.pipeline.read_at(dir_address as u64, cluster_size)?;

        for (slot, bytes) in cluster.chunks_exact(DirectoryEntry::SIZE).enumerate() {
            if DirectoryEntry::from_bytes(bytes)?.is_empty_slot() {
                let offset = dir_address as u64 + (slot * DirectoryEntry::SIZE) as u64;
                self.pipeline.write_at(offset, &entry.to_bytes())?;
                return Ok(());
            }
        }

        tracing::debug!(dir_address, name = %entry.name, "directory full");
        Err(Error::NoSpace)
    }

    /// Clear the slot whose entry starts at `start_cluster`
    ///
    /// Entries are identified by their start cluster; no two occupied slots
    /// can share one.
    pub(crate) fn remove_entry(&mut self, dir_address: u32, start_cluster: u32) -> Result<()> {
        let cluster_size = self.sb()?.cluster_size as usize;
        let cluster = self.pipeline.read_at(dir_address as u64, cluster_size)?;

        for (slot, bytes) in cluster.chunks_exact(DirectoryEntry::SIZE).enumerate() {
            if DirectoryEntry::from_bytes(bytes)?.start_cluster == start_cluster {
                let offset = dir_address as u64 + (slot * DirectoryEntry::SIZE) as u64;
                self.pipeline
                    .write_at(offset, &[0u8; DirectoryEntry::SIZE])?;
                return Ok(());
            }
        }

        Err(Error::corrupted(format!(
            "no entry with start cluster {} in directory {}",
            start_cluster, dir_address
        )))
    }
}
