//! Path resolver: pure component-wise traversal of `/`-separated paths
//!
//! Resolution never touches the working directory; `cd` is the only
//! operation that commits a resolved location back into it.

use zapfs_core::{Error, Result};

use crate::volume::{Volume, WorkingDirectory};

/// Outcome of resolving everything but a path's last component
#[derive(Debug, Clone)]
pub(crate) struct ResolvedParent {
    /// Byte address of the parent directory cluster
    pub address: u32,
    /// Final path component, not yet looked up
    pub leaf: String,
}

impl Volume {
    /// Resolve a directory path to its cluster address and absolute form
    ///
    /// A leading `/` starts at the root, anything else at the working
    /// directory. `.` stays in place, `..` follows the directory's own
    /// parent slot, empty components are ignored. Every named component
    /// must be an existing directory.
    pub(crate) fn resolve_dir(&mut self, path: &str) -> Result<(u32, String)> {
        let (mut address, mut abs_path) = if path.starts_with('/') {
            (self.sb()?.root_address(), "/".to_string())
        } else {
            (self.cwd.cluster_address, self.cwd.path.clone())
        };

        for component in path.split('/').filter(|c| !c.is_empty()) {
            match component {
                "." => {}
                ".." => {
                    let parent = self.find_entry(address, "..")?.ok_or_else(|| {
                        Error::corrupted(format!("directory {} has no parent slot", address))
                    })?;
                    address = parent.start_cluster;
                    pop_segment(&mut abs_path);
                }
                name => match self.find_entry(address, name)? {
                    Some(entry) if entry.is_directory => {
                        address = entry.start_cluster;
                        abs_path.push_str(name);
                        abs_path.push('/');
                    }
                    _ => return Err(Error::PathNotFound),
                },
            }
        }

        Ok((address, abs_path))
    }

    /// Resolve the parent directory of a path's last component
    ///
    /// The leaf itself is not looked up; callers decide whether it must or
    /// must not exist.
    pub(crate) fn resolve_parent(&mut self, path: &str) -> Result<ResolvedParent> {
        match path.rfind('/') {
            None if path.is_empty() => Err(Error::PathNotFound),
            None => Ok(ResolvedParent {
                address: self.cwd.cluster_address,
                leaf: path.to_string(),
            }),
            Some(i) => {
                let leaf = &path[i + 1..];
                if leaf.is_empty() {
                    return Err(Error::PathNotFound);
                }
                let (address, _) = self.resolve_dir(&path[..=i])?;
                Ok(ResolvedParent {
                    address,
                    leaf: leaf.to_string(),
                })
            }
        }
    }

    /// Change the working directory
    ///
    /// No argument, an empty path, or `/` jumps to the root.
    pub fn change_dir(&mut self, path: Option<&str>) -> Result<()> {
        match path {
            None | Some("") | Some("/") => {
                self.cwd = self.load_root()?;
            }
            Some(path) => {
                let (address, abs_path) = self.resolve_dir(path)?;
                let entries = self.list_entries(address)?;
                self.cwd = WorkingDirectory {
                    cluster_address: address,
                    path: abs_path,
                    entries,
                };
            }
        }

        tracing::trace!(path = %self.cwd.path, "working directory changed");
        Ok(())
    }
}

/// Strip the last named segment from an absolute path ending in `/`
fn pop_segment(path: &mut String) {
    if path == "/" {
        return;
    }
    path.truncate(path.len() - 1);
    let cut = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    path.truncate(cut);
}
