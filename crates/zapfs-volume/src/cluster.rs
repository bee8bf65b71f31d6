//! Cluster store: payload read/write/zero at cluster byte addresses

use zapfs_core::{Error, Result};

use crate::volume::Volume;

impl Volume {
    /// Read `len` payload bytes from the cluster at `address`
    pub(crate) fn read_cluster(&mut self, address: u32, len: usize) -> Result<Vec<u8>> {
        let sb = self.sb()?;
        if len > sb.cluster_size as usize {
            return Err(Error::corrupted(format!(
                "cluster read of {} bytes exceeds cluster size {}",
                len, sb.cluster_size
            )));
        }

        Ok(self.pipeline.read_at(address as u64, len)?)
    }

    /// Write `bytes` at the head of the cluster at `address`
    ///
    /// Bytes beyond `bytes.len()` keep whatever the cluster already holds;
    /// freed clusters are cleared through [`Volume::zero_cluster`] instead.
    pub(crate) fn write_cluster(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let sb = self.sb()?;
        if bytes.len() > sb.cluster_size as usize {
            return Err(Error::corrupted(format!(
                "cluster write of {} bytes exceeds cluster size {}",
                bytes.len(),
                sb.cluster_size
            )));
        }

        self.pipeline.write_at(address as u64, bytes)?;
        Ok(())
    }

    /// Overwrite the full cluster at `address` with NUL bytes
    pub(crate) fn zero_cluster(&mut self, address: u32) -> Result<()> {
        let cluster_size = self.sb()?.cluster_size as usize;
        self.pipeline
            .write_at(address as u64, &vec![0u8; cluster_size])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Volume;
    use tempfile::tempdir;
    use zapfs_core::KB;

    fn scratch_volume() -> (Volume, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut volume = Volume::open(&dir.path().join("volume.dat")).unwrap();
        volume.format(64 * KB).unwrap();
        (volume, dir)
    }

    #[test]
    fn test_cluster_roundtrip() {
        let (mut volume, _dir) = scratch_volume();
        let address = volume.cluster_address(2).unwrap();

        volume.write_cluster(address, b"hello cluster").unwrap();
        assert_eq!(
            volume.read_cluster(address, 13).unwrap(),
            b"hello cluster"
        );
    }

    #[test]
    fn test_partial_write_keeps_tail() {
        let (mut volume, _dir) = scratch_volume();
        let address = volume.cluster_address(2).unwrap();

        volume.write_cluster(address, &[0xAA; 1024]).unwrap();
        volume.write_cluster(address, b"head").unwrap();

        let payload = volume.read_cluster(address, 1024).unwrap();
        assert_eq!(&payload[..4], b"head");
        assert!(payload[4..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_zero_cluster() {
        let (mut volume, _dir) = scratch_volume();
        let address = volume.cluster_address(2).unwrap();

        volume.write_cluster(address, &[0xAA; 1024]).unwrap();
        volume.zero_cluster(address).unwrap();

        let payload = volume.read_cluster(address, 1024).unwrap();
        assert!(payload.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_oversized_access_rejected() {
        let (mut volume, _dir) = scratch_volume();
        let address = volume.cluster_address(2).unwrap();

        assert!(volume.read_cluster(address, 1025).is_err());
        assert!(volume.write_cluster(address, &[0u8; 1025]).is_err());
    }
}
