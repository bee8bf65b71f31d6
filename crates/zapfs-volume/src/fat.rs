//! FAT engine: cell access, address translation, first-free scan, chains

use zapfs_core::{Error, FatCell, Result, FAT_CELL_SIZE};

use crate::volume::Volume;

impl Volume {
    /// Read the FAT cell of the cluster at `index`
    pub(crate) fn read_fat(&mut self, index: u32) -> Result<FatCell> {
        let sb = self.sb()?;
        if index >= sb.cluster_count {
            return Err(Error::corrupted(format!(
                "FAT index {} out of range (cluster count {})",
                index, sb.cluster_count
            )));
        }

        let offset = sb.fat_start_address + index * FAT_CELL_SIZE;
        let bytes = self.pipeline.read_at(offset as u64, FAT_CELL_SIZE as usize)?;
        Ok(FatCell::from_raw(i32::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ])))
    }

    /// Write the FAT cell of the cluster at `index`
    pub(crate) fn write_fat(&mut self, index: u32, cell: FatCell) -> Result<()> {
        let sb = self.sb()?;
        if index >= sb.cluster_count {
            return Err(Error::corrupted(format!(
                "FAT index {} out of range (cluster count {})",
                index, sb.cluster_count
            )));
        }

        let offset = sb.fat_start_address + index * FAT_CELL_SIZE;
        self.pipeline
            .write_at(offset as u64, &cell.to_raw().to_le_bytes())?;
        Ok(())
    }

    /// Byte address of the cluster at `index`
    pub(crate) fn cluster_address(&self, index: u32) -> Result<u32> {
        let sb = self.sb()?;
        Ok(sb.data_start_address + index * sb.cluster_size)
    }

    /// Cluster index of the cluster at byte address `address`
    ///
    /// # Errors
    ///
    /// Rejects addresses outside the data region or not aligned to a
    /// cluster boundary; such values can only come from a damaged FAT.
    pub(crate) fn cluster_index(&self, address: u32) -> Result<u32> {
        let sb = self.sb()?;
        let span = sb.cluster_count * sb.cluster_size;

        if address < sb.data_start_address || address >= sb.data_start_address + span {
            return Err(Error::corrupted(format!(
                "cluster address {} outside data region",
                address
            )));
        }

        let relative = address - sb.data_start_address;
        if relative % sb.cluster_size != 0 {
            return Err(Error::corrupted(format!(
                "cluster address {} not cluster-aligned",
                address
            )));
        }

        Ok(relative / sb.cluster_size)
    }

    /// Index of the lowest free cluster, or `None` when the volume is full
    pub(crate) fn find_free_cluster(&mut self) -> Result<Option<u32>> {
        let table = self.fat_table()?;
        Ok(table
            .iter()
            .position(|cell| *cell == FatCell::Free)
            .map(|index| index as u32))
    }

    /// Byte addresses of a chain, from `start` to the end-of-chain cell
    ///
    /// # Errors
    ///
    /// Fails on a chain longer than the cluster count (a cycle) or on a
    /// cell holding anything other than a next-pointer or end-of-chain.
    pub(crate) fn chain_addresses(&mut self, start: u32) -> Result<Vec<u32>> {
        let cluster_count = self.sb()?.cluster_count as usize;
        let mut chain = Vec::new();
        let mut address = start;

        loop {
            chain.push(address);
            if chain.len() > cluster_count {
                return Err(Error::corrupted("FAT chain exceeds cluster count"));
            }

            let index = self.cluster_index(address)?;
            match self.read_fat(index)? {
                FatCell::EndOfChain => break,
                FatCell::Next(next) => address = next,
                cell => {
                    return Err(Error::corrupted(format!(
                        "chain cluster {} holds {}",
                        index, cell
                    )))
                }
            }
        }

        Ok(chain)
    }

    /// Return transiently allocated clusters to the free state
    ///
    /// Used to roll an operation back when it runs out of space mid-chain:
    /// the cells go back to free and the payloads are zeroed so the
    /// free-implies-zeroed invariant survives the failure.
    pub(crate) fn release_clusters(&mut self, indices: &[u32]) -> Result<()> {
        for &index in indices {
            let address = self.cluster_address(index)?;
            self.zero_cluster(address)?;
            self.write_fat(index, FatCell::Free)?;
        }
        Ok(())
    }
}
