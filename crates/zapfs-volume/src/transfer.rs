//! File content transfer: host import/export, in-volume copy
//!
//! Chains are grown cluster by cluster: each new cluster is marked
//! end-of-chain *before* the previous cell is rewritten to point at it, so
//! the first-free scan can never hand out a cluster that is already in
//! flight.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zapfs_core::{DirectoryEntry, Error, FatCell, Result};

use crate::volume::Volume;

impl Volume {
    /// Copy the host file `host_src` into the volume at `image_dst`
    ///
    /// # Errors
    ///
    /// `FILE NOT FOUND` when the host file cannot be opened,
    /// `FILE ALREADY EXISTS` when the destination leaf is taken,
    /// `NO SPACE` when the volume or the destination directory is full.
    pub fn import(&mut self, host_src: &Path, image_dst: &str) -> Result<()> {
        self.sb()?;
        let parent = self.resolve_parent(image_dst)?;

        let mut host = File::open(host_src).map_err(|_| Error::FileNotFound)?;
        let mut data = Vec::new();
        host.read_to_end(&mut data)?;

        if self.find_entry(parent.address, &parent.leaf)?.is_some() {
            return Err(Error::FileAlreadyExists);
        }

        self.create_file(parent.address, &parent.leaf, &data)?;
        tracing::debug!(
            host = %host_src.display(),
            image_dst,
            bytes = data.len(),
            "file imported"
        );
        self.refresh_cwd()
    }

    /// Copy the volume file `image_src` out to the host file `host_dst`
    ///
    /// The host file is created (truncated) before the source lookup, as a
    /// missing destination path must win over a missing source.
    pub fn export(&mut self, image_src: &str, host_dst: &Path) -> Result<()> {
        self.sb()?;
        let parent = self.resolve_parent(image_src)?;

        let mut host = File::create(host_dst).map_err(|_| Error::PathNotFound)?;
        let entry = self
            .find_entry(parent.address, &parent.leaf)?
            .ok_or(Error::FileNotFound)?;

        let data = self.read_entry_data(&entry)?;
        host.write_all(&data)?;
        host.flush()?;

        tracing::debug!(image_src, host = %host_dst.display(), bytes = data.len(), "file exported");
        Ok(())
    }

    /// Copy the file `src` to `dst` inside the volume
    ///
    /// Allocates a parallel chain; source and copy share no cluster.
    pub fn copy(&mut self, src: &str, dst: &str) -> Result<()> {
        self.sb()?;
        let src_parent = self.resolve_parent(src)?;
        let entry = self
            .find_entry(src_parent.address, &src_parent.leaf)?
            .ok_or(Error::FileNotFound)?;
        if entry.is_directory {
            return Err(Error::IsDirectory);
        }
        let data = self.read_entry_data(&entry)?;

        let dst_parent = self.resolve_parent(dst)?;
        if self.find_entry(dst_parent.address, &dst_parent.leaf)?.is_some() {
            return Err(Error::FileAlreadyExists);
        }

        self.create_file(dst_parent.address, &dst_parent.leaf, &data)?;
        tracing::debug!(src, dst, bytes = data.len(), "file copied");
        self.refresh_cwd()
    }

    /// Write `data` as a fresh chain and append its entry to a directory
    ///
    /// Rolls every transiently allocated cluster back when the volume or
    /// the directory runs out of space.
    pub(crate) fn create_file(
        &mut self,
        parent_address: u32,
        leaf: &str,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > u32::MAX as usize {
            return Err(Error::NoSpace);
        }

        let (start_address, allocated) = self.write_file_data(data)?;
        let entry = DirectoryEntry::file(leaf, data.len() as u32, start_address);
        if let Err(err) = self.append_entry(parent_address, &entry) {
            self.release_clusters(&allocated)?;
            return Err(err);
        }
        Ok(())
    }

    /// Allocate a chain for `data` and fill it, one cluster per chunk
    ///
    /// An empty payload still allocates its first cluster. Returns the
    /// chain's start address and the allocated cluster indices.
    pub(crate) fn write_file_data(&mut self, data: &[u8]) -> Result<(u32, Vec<u32>)> {
        let cluster_size = self.sb()?.cluster_size as usize;
        let chunk_count = if data.is_empty() {
            1
        } else {
            data.len().div_ceil(cluster_size)
        };

        let mut allocated: Vec<u32> = Vec::with_capacity(chunk_count);
        let mut previous: Option<u32> = None;
        let mut start_address = 0u32;

        for i in 0..chunk_count {
            let index = match self.find_free_cluster()? {
                Some(index) => index,
                None => {
                    self.release_clusters(&allocated)?;
                    return Err(Error::NoSpace);
                }
            };

            // Claim before linking, so the next scan skips this cluster
            self.write_fat(index, FatCell::EndOfChain)?;
            let address = self.cluster_address(index)?;
            if let Some(prev) = previous {
                self.write_fat(prev, FatCell::Next(address))?;
            } else {
                start_address = address;
            }
            previous = Some(index);
            allocated.push(index);

            let chunk = &data[(i * cluster_size).min(data.len())..((i + 1) * cluster_size).min(data.len())];
            if !chunk.is_empty() {
                self.write_cluster(address, chunk)?;
            }
        }

        Ok((start_address, allocated))
    }

    /// Read an entry's full content by walking its chain
    ///
    /// The last cluster contributes only the size remainder.
    pub(crate) fn read_entry_data(&mut self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
        let cluster_size = self.sb()?.cluster_size as usize;
        let chain = self.chain_addresses(entry.start_cluster)?;

        let mut data = Vec::with_capacity(entry.size as usize);
        let mut remaining = entry.size as usize;
        for address in chain {
            if remaining == 0 {
                break;
            }
            let to_read = remaining.min(cluster_size);
            data.extend_from_slice(&self.read_cluster(address, to_read)?);
            remaining -= to_read;
        }

        if remaining > 0 {
            return Err(Error::corrupted("chain shorter than recorded size"));
        }
        Ok(data)
    }
}
