//! On-disk defragmentation of a single file
//!
//! Moves a file's chain onto a dense, ascending run of clusters. The hunt
//! for the run parks rejected candidates in a reserved FAT state so the
//! first-free scan cannot return them again; every parked cell is swept
//! back to free before the operation returns, on success and failure alike.

use std::collections::VecDeque;

use zapfs_core::{DirectoryEntry, Error, FatCell, Result};

use crate::volume::Volume;

impl Volume {
    /// Make the file at `path` occupy consecutive, ascending clusters
    ///
    /// Returns `false` when the file was already contiguous and nothing was
    /// moved, `true` when the chain was relocated.
    ///
    /// # Errors
    ///
    /// `FILE NOT FOUND` / `IS DIR` for a bad target, `NO SPACE` when no
    /// dense run of the required length exists.
    pub fn defrag(&mut self, path: &str) -> Result<bool> {
        self.sb()?;
        let parent = self.resolve_parent(path)?;
        let entry = self
            .find_entry(parent.address, &parent.leaf)?
            .ok_or(Error::FileNotFound)?;
        if entry.is_directory {
            return Err(Error::IsDirectory);
        }

        let old_addresses = self.chain_addresses(entry.start_cluster)?;
        let mut old_indices = Vec::with_capacity(old_addresses.len());
        for address in &old_addresses {
            old_indices.push(self.cluster_index(*address)?);
        }
        if is_consecutive(&old_indices) {
            return Ok(false);
        }

        let new_indices = self.reserve_consecutive(old_indices.len())?;

        // Move the payloads, full cluster at a time
        let cluster_size = self.sb()?.cluster_size as usize;
        for (i, &old_address) in old_addresses.iter().enumerate() {
            let payload = self.read_cluster(old_address, cluster_size)?;
            let new_address = self.cluster_address(new_indices[i])?;
            self.write_cluster(new_address, &payload)?;
        }

        // Chain the run; its last cell already terminates it
        for pair in new_indices.windows(2) {
            let next_address = self.cluster_address(pair[1])?;
            self.write_fat(pair[0], FatCell::Next(next_address))?;
        }

        self.release_clusters(&old_indices)?;

        // Entries are identified by start cluster: replace, never edit
        let new_start = self.cluster_address(new_indices[0])?;
        self.remove_entry(parent.address, entry.start_cluster)?;
        let moved = DirectoryEntry::file(&entry.name, entry.size, new_start);
        self.append_entry(parent.address, &moved)?;

        tracing::debug!(
            path,
            first = new_indices[0],
            length = new_indices.len(),
            "file made contiguous"
        );
        self.refresh_cwd()?;
        Ok(true)
    }

    /// Claim `length` consecutive free cluster indices
    ///
    /// Candidates come from the first-free scan and are claimed as
    /// end-of-chain immediately. A sliding window holds the most recent
    /// `length` candidates; whenever it is full but not dense, its head is
    /// parked as reserved and dropped. The reserved cells go back to free
    /// once the hunt ends.
    fn reserve_consecutive(&mut self, length: usize) -> Result<Vec<u32>> {
        let mut window: VecDeque<u32> = VecDeque::with_capacity(length);

        loop {
            let candidate = match self.find_free_cluster()? {
                Some(index) => index,
                None => {
                    let held: Vec<u32> = window.iter().copied().collect();
                    for index in held {
                        self.write_fat(index, FatCell::Free)?;
                    }
                    self.sweep_reserved()?;
                    return Err(Error::NoSpace);
                }
            };

            self.write_fat(candidate, FatCell::EndOfChain)?;
            window.push_back(candidate);

            if window.len() == length {
                if is_dense(&window) {
                    break;
                }
                if let Some(head) = window.pop_front() {
                    self.write_fat(head, FatCell::Reserved)?;
                }
            }
        }

        self.sweep_reserved()?;
        Ok(window.into_iter().collect())
    }

    /// Return every parked FAT cell to the free state
    fn sweep_reserved(&mut self) -> Result<()> {
        let table = self.fat_table()?;
        for (index, cell) in table.iter().enumerate() {
            if *cell == FatCell::Reserved {
                self.write_fat(index as u32, FatCell::Free)?;
            }
        }
        Ok(())
    }
}

fn is_consecutive(indices: &[u32]) -> bool {
    indices.windows(2).all(|pair| pair[1] == pair[0] + 1)
}

fn is_dense(window: &VecDeque<u32>) -> bool {
    window
        .iter()
        .zip(window.iter().skip(1))
        .all(|(a, b)| *b == *a + 1)
}
