//! Directory and file operations: create, remove, list, inspect, move
//!
//! Every mutating operation resolves its paths first, mutates only once all
//! checks pass, and refreshes the working-directory snapshot on success; a
//! failed operation leaves the snapshot untouched.

use zapfs_core::{DirectoryEntry, EntryInfo, Error, FatCell, FileReport, Result};

use crate::volume::Volume;

impl Volume {
    /// Create a directory at `path`
    ///
    /// # Errors
    ///
    /// `DIR ALREADY EXISTS` when the leaf name is taken, `PATH NOT FOUND`
    /// when the parent cannot be resolved, `NO SPACE` when no cluster is
    /// free or the parent directory is full.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        self.sb()?;
        let parent = self.resolve_parent(path)?;
        if self.find_entry(parent.address, &parent.leaf)?.is_some() {
            return Err(Error::DirAlreadyExists);
        }

        let index = self.find_free_cluster()?.ok_or(Error::NoSpace)?;
        let address = self.cluster_address(index)?;
        self.write_fat(index, FatCell::EndOfChain)?;
        self.append_entry(address, &DirectoryEntry::directory(".", address))?;
        self.append_entry(address, &DirectoryEntry::directory("..", parent.address))?;

        let entry = DirectoryEntry::directory(&parent.leaf, address);
        if let Err(err) = self.append_entry(parent.address, &entry) {
            self.release_clusters(&[index])?;
            return Err(err);
        }

        tracing::debug!(path, cluster = index, "directory created");
        self.refresh_cwd()
    }

    /// Remove the empty directory at `path`
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        self.sb()?;
        if path.rsplit('/').next().unwrap_or(path) == "." {
            return Err(Error::CannotRemoveCurrentDir);
        }

        let parent = self.resolve_parent(path)?;
        let entry = self
            .find_entry(parent.address, &parent.leaf)?
            .ok_or(Error::DirNotFound)?;
        if !entry.is_directory {
            return Err(Error::NotADirectory);
        }
        if self.list_entries(entry.start_cluster)?.len() > 2 {
            return Err(Error::DirNotEmpty);
        }

        let index = self.cluster_index(entry.start_cluster)?;
        self.write_fat(index, FatCell::Free)?;
        self.zero_cluster(entry.start_cluster)?;
        self.remove_entry(parent.address, entry.start_cluster)?;

        tracing::debug!(path, cluster = index, "directory removed");
        self.refresh_cwd()
    }

    /// Remove the file at `path`, freeing and zeroing its whole chain
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        self.sb()?;
        let parent = self.resolve_parent(path)?;
        let entry = self
            .find_entry(parent.address, &parent.leaf)?
            .ok_or(Error::FileNotFound)?;
        if entry.is_directory {
            return Err(Error::IsDirectory);
        }

        let chain = self.chain_addresses(entry.start_cluster)?;
        for address in &chain {
            let index = self.cluster_index(*address)?;
            self.zero_cluster(*address)?;
            self.write_fat(index, FatCell::Free)?;
        }
        self.remove_entry(parent.address, entry.start_cluster)?;

        tracing::debug!(path, clusters = chain.len(), "file removed");
        self.refresh_cwd()
    }

    /// Read the full content of the file at `path`
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        self.sb()?;
        let parent = self.resolve_parent(path)?;
        let entry = self
            .find_entry(parent.address, &parent.leaf)?
            .ok_or(Error::FileNotFound)?;
        if entry.is_directory {
            return Err(Error::IsDirectory);
        }

        self.read_entry_data(&entry)
    }

    /// List a directory: the working directory, or the one at `path`
    ///
    /// `.` and `..` are listed alongside children.
    pub fn list(&mut self, path: Option<&str>) -> Result<Vec<EntryInfo>> {
        self.sb()?;
        let entries = match path {
            Some(path) => {
                let (address, _) = self.resolve_dir(path)?;
                self.list_entries(address)?
            }
            None => self.cwd.entries.clone(),
        };

        Ok(entries.iter().map(EntryInfo::from).collect())
    }

    /// Describe the item at `path`, chain of cluster indices included
    pub fn stat(&mut self, path: &str) -> Result<FileReport> {
        self.sb()?;
        let parent = self.resolve_parent(path)?;
        let entry = self
            .find_entry(parent.address, &parent.leaf)?
            .ok_or(Error::FileNotFound)?;

        let clusters = self
            .chain_addresses(entry.start_cluster)?
            .into_iter()
            .map(|address| self.cluster_index(address))
            .collect::<Result<Vec<u32>>>()?;

        Ok(FileReport {
            name: entry.name,
            is_directory: entry.is_directory,
            size: entry.size,
            start_cluster: entry.start_cluster,
            clusters,
        })
    }

    /// Move `src` to `dst`, renaming on the way when the leaves differ
    ///
    /// Pure entry relocation: no data cluster or FAT cell is touched.
    pub fn rename(&mut self, src: &str, dst: &str) -> Result<()> {
        self.sb()?;
        let src_parent = self.resolve_parent(src)?;
        let entry = self
            .find_entry(src_parent.address, &src_parent.leaf)?
            .ok_or(Error::FileNotFound)?;

        let dst_parent = self.resolve_parent(dst)?;
        if self.find_entry(dst_parent.address, &dst_parent.leaf)?.is_some() {
            return Err(Error::FileAlreadyExists);
        }

        self.remove_entry(src_parent.address, entry.start_cluster)?;
        let moved = if entry.is_directory {
            DirectoryEntry::directory(&dst_parent.leaf, entry.start_cluster)
        } else {
            DirectoryEntry::file(&dst_parent.leaf, entry.size, entry.start_cluster)
        };
        if let Err(err) = self.append_entry(dst_parent.address, &moved) {
            // Destination directory full: put the source entry back
            self.append_entry(src_parent.address, &entry)?;
            return Err(err);
        }

        tracing::debug!(src, dst, "entry relocated");
        self.refresh_cwd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Volume;
    use tempfile::tempdir;
    use zapfs_core::KB;

    fn scratch_volume(size: u64) -> (Volume, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut volume = Volume::open(&dir.path().join("volume.dat")).unwrap();
        volume.format(size).unwrap();
        (volume, dir)
    }

    fn import_bytes(volume: &mut Volume, dir: &tempfile::TempDir, dst: &str, data: &[u8]) {
        let host = dir.path().join(format!("host-{}", dst.replace('/', "_")));
        std::fs::write(&host, data).unwrap();
        volume.import(&host, dst).unwrap();
    }

    #[test]
    fn test_mkdir_and_list() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("docs").unwrap();

        let names: Vec<String> = volume
            .list(None)
            .unwrap()
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(names, vec![".", "..", "docs"]);

        // The new directory starts with its two reserved slots
        let inside = volume.list(Some("docs")).unwrap();
        assert_eq!(inside.len(), 2);
        assert_eq!(inside[0].name, ".");
        assert_eq!(inside[1].name, "..");
    }

    #[test]
    fn test_mkdir_dot_slots_point_home() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();
        volume.mkdir("a/b").unwrap();

        let root = volume.superblock().unwrap().root_address();
        let a = volume.find_entry(root, "a").unwrap().unwrap().start_cluster;
        let b = volume.find_entry(a, "b").unwrap().unwrap().start_cluster;

        let slots = volume.list_entries(b).unwrap();
        assert_eq!(slots[0].name, ".");
        assert_eq!(slots[0].start_cluster, b);
        assert_eq!(slots[1].name, "..");
        assert_eq!(slots[1].start_cluster, a);
    }

    #[test]
    fn test_mkdir_duplicate() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();
        assert!(matches!(volume.mkdir("a"), Err(Error::DirAlreadyExists)));
    }

    #[test]
    fn test_mkdir_missing_parent() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        assert!(matches!(volume.mkdir("no/dir"), Err(Error::PathNotFound)));
    }

    #[test]
    fn test_rmdir_restores_cluster() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();

        let root = volume.superblock().unwrap().root_address();
        let address = volume.find_entry(root, "a").unwrap().unwrap().start_cluster;
        let index = volume.cluster_index(address).unwrap();

        volume.rmdir("a").unwrap();

        // Transient allocation fully undone: cell free, payload zeroed
        assert_eq!(volume.read_fat(index).unwrap(), FatCell::Free);
        let payload = volume.read_cluster(address, 1024).unwrap();
        assert!(payload.iter().all(|&b| b == 0));
        assert!(volume.find_entry(root, "a").unwrap().is_none());
    }

    #[test]
    fn test_rmdir_not_empty() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();
        volume.change_dir(Some("a")).unwrap();
        volume.mkdir("b").unwrap();
        volume.change_dir(Some("..")).unwrap();

        assert!(matches!(volume.rmdir("a"), Err(Error::DirNotEmpty)));
    }

    #[test]
    fn test_rmdir_refusals() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        import_bytes(&mut volume, &dir, "f", b"data");

        assert!(matches!(volume.rmdir("."), Err(Error::CannotRemoveCurrentDir)));
        assert!(matches!(volume.rmdir("f"), Err(Error::NotADirectory)));
        assert!(matches!(volume.rmdir("ghost"), Err(Error::DirNotFound)));
    }

    #[test]
    fn test_rm_frees_whole_chain() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        import_bytes(&mut volume, &dir, "f", &[0x5A; 2500]);

        let report = volume.stat("f").unwrap();
        assert_eq!(report.clusters.len(), 3);

        volume.remove_file("f").unwrap();

        for index in report.clusters {
            assert_eq!(volume.read_fat(index).unwrap(), FatCell::Free);
            let address = volume.cluster_address(index).unwrap();
            let payload = volume.read_cluster(address, 1024).unwrap();
            assert!(payload.iter().all(|&b| b == 0));
        }
        assert!(matches!(volume.read_file("f"), Err(Error::FileNotFound)));
    }

    #[test]
    fn test_rm_refusals() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();

        assert!(matches!(volume.remove_file("a"), Err(Error::IsDirectory)));
        assert!(matches!(volume.remove_file("ghost"), Err(Error::FileNotFound)));
    }

    #[test]
    fn test_read_file_content() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        import_bytes(&mut volume, &dir, "f", &data);

        assert_eq!(volume.read_file("f").unwrap(), data);
    }

    #[test]
    fn test_read_file_exact_multiple_of_cluster() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        let data = vec![0xC3; 2048];
        import_bytes(&mut volume, &dir, "f", &data);

        assert_eq!(volume.stat("f").unwrap().clusters.len(), 2);
        assert_eq!(volume.read_file("f").unwrap(), data);
    }

    #[test]
    fn test_empty_file_occupies_one_cluster() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        import_bytes(&mut volume, &dir, "f", b"");

        let report = volume.stat("f").unwrap();
        assert_eq!(report.size, 0);
        assert_eq!(report.clusters.len(), 1);
        assert!(volume.read_file("f").unwrap().is_empty());

        volume.remove_file("f").unwrap();
        assert_eq!(volume.read_fat(report.clusters[0]).unwrap(), FatCell::Free);
    }

    #[test]
    fn test_stat_directory() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();

        let report = volume.stat("a").unwrap();
        assert!(report.is_directory);
        assert_eq!(report.size, 0);
        assert_eq!(report.clusters.len(), 1);
    }

    #[test]
    fn test_stat_fresh_import_is_consecutive() {
        let (mut volume, dir) = scratch_volume(8 * KB);
        import_bytes(&mut volume, &dir, "x", &[7u8; 2500]);

        let report = volume.stat("x").unwrap();
        assert_eq!(report.clusters, vec![1, 2, 3]);
        assert_eq!(report.size, 2500);
    }

    #[test]
    fn test_freed_clusters_are_reused_lowest_first() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        import_bytes(&mut volume, &dir, "a", &[1u8; 2048]);
        import_bytes(&mut volume, &dir, "b", &[2u8; 2048]);
        import_bytes(&mut volume, &dir, "c", &[3u8; 2048]);

        assert_eq!(volume.stat("b").unwrap().clusters, vec![3, 4]);
        volume.remove_file("b").unwrap();

        import_bytes(&mut volume, &dir, "d", &[4u8; 2048]);
        assert_eq!(volume.stat("d").unwrap().clusters, vec![3, 4]);
        assert_eq!(volume.read_file("c").unwrap(), vec![3u8; 2048]);
    }

    #[test]
    fn test_rename_in_place() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        import_bytes(&mut volume, &dir, "old", b"payload");
        let before = volume.stat("old").unwrap();

        volume.rename("old", "new").unwrap();

        assert!(matches!(volume.stat("old"), Err(Error::FileNotFound)));
        let after = volume.stat("new").unwrap();
        assert_eq!(after.start_cluster, before.start_cluster);
        assert_eq!(after.size, before.size);
        assert_eq!(volume.read_file("new").unwrap(), b"payload");
    }

    #[test]
    fn test_rename_roundtrip_is_identity() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        volume.mkdir("d").unwrap();
        import_bytes(&mut volume, &dir, "a", b"payload");
        let before = volume.stat("a").unwrap();

        volume.rename("a", "d/a").unwrap();
        volume.rename("d/a", "a").unwrap();

        let after = volume.stat("a").unwrap();
        assert_eq!(after.start_cluster, before.start_cluster);
        assert_eq!(after.size, before.size);
        assert_eq!(after.clusters, before.clusters);
    }

    #[test]
    fn test_rename_refusals() {
        let (mut volume, dir) = scratch_volume(64 * KB);
        import_bytes(&mut volume, &dir, "a", b"1");
        import_bytes(&mut volume, &dir, "b", b"2");

        assert!(matches!(
            volume.rename("a", "b"),
            Err(Error::FileAlreadyExists)
        ));
        assert!(matches!(
            volume.rename("ghost", "c"),
            Err(Error::FileNotFound)
        ));
    }

    #[test]
    fn test_rename_moves_directories() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();
        volume.mkdir("b").unwrap();
        volume.mkdir("a/sub").unwrap();

        volume.rename("a/sub", "b/sub").unwrap();

        assert!(volume.list(Some("b/sub")).is_ok());
        assert_eq!(volume.list(Some("a")).unwrap().len(), 2);
    }

    #[test]
    fn test_list_includes_dot_slots() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();
        volume.change_dir(Some("a")).unwrap();

        let names: Vec<String> = volume
            .list(None)
            .unwrap()
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(names, vec![".", ".."]);
    }

    #[test]
    fn test_snapshot_refreshes_after_mutation() {
        let (mut volume, _dir) = scratch_volume(64 * KB);
        volume.mkdir("a").unwrap();

        // mkdir in the working directory shows up without an explicit cd
        assert!(volume
            .list(None)
            .unwrap()
            .iter()
            .any(|info| info.name == "a"));

        volume.rmdir("a").unwrap();
        assert!(!volume
            .list(None)
            .unwrap()
            .iter()
            .any(|info| info.name == "a"));
    }
}
