//! On-disk records and shared constants for the pseudo-FAT volume
//!
//! The image is little-endian and naturally packed: every record is
//! serialized field by field, never by dumping an in-memory struct.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// 1024 bytes
pub const KB: u64 = 1024;
/// 1024 KB
pub const MB: u64 = 1024 * KB;
/// 1024 MB
pub const GB: u64 = 1024 * MB;

/// Cluster payload size in bytes (fixed for every formatted volume)
pub const DEFAULT_CLUSTER_SIZE: u32 = 1024;

/// Size of one FAT cell on disk
pub const FAT_CELL_SIZE: u32 = 4;

/// Decoded view of one 32-bit FAT cell
///
/// A cell either carries a sentinel or the byte address of the next cluster
/// in the chain. `Reserved` is a transient parking state used while hunting
/// for a dense run of clusters; it is never left behind by a completed
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatCell {
    /// Cluster is free for allocation
    Free,
    /// Cluster terminates its chain
    EndOfChain,
    /// Cluster is unusable
    Bad,
    /// Cluster is temporarily withheld from allocation
    Reserved,
    /// Byte address of the next cluster in the chain
    Next(u32),
}

impl FatCell {
    /// Raw value of [`FatCell::Free`]
    pub const FREE: i32 = -1;
    /// Raw value of [`FatCell::EndOfChain`]
    pub const END_OF_CHAIN: i32 = -2;
    /// Raw value of [`FatCell::Bad`]
    pub const BAD: i32 = -3;
    /// Raw value of [`FatCell::Reserved`]
    pub const RESERVED: i32 = -4;

    /// Decode a raw cell value
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::FREE => FatCell::Free,
            Self::END_OF_CHAIN => FatCell::EndOfChain,
            Self::BAD => FatCell::Bad,
            Self::RESERVED => FatCell::Reserved,
            next => FatCell::Next(next as u32),
        }
    }

    /// Encode to the raw cell value
    pub fn to_raw(self) -> i32 {
        match self {
            FatCell::Free => Self::FREE,
            FatCell::EndOfChain => Self::END_OF_CHAIN,
            FatCell::Bad => Self::BAD,
            FatCell::Reserved => Self::RESERVED,
            FatCell::Next(address) => address as i32,
        }
    }
}

impl fmt::Display for FatCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatCell::Free => write!(f, "FREE"),
            FatCell::EndOfChain => write!(f, "EOF"),
            FatCell::Bad => write!(f, "BAD"),
            FatCell::Reserved => write!(f, "RESERVED"),
            FatCell::Next(address) => write!(f, "{}", address),
        }
    }
}

/// Superblock written once at image offset 0
///
/// On disk this is exactly [`Superblock::SIZE`] bytes: the 9-byte signature
/// followed by five little-endian u32 fields. The FAT byte size is derived
/// from the cluster count rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    /// Total image size in bytes, superblock included
    pub disk_size: u32,
    /// Cluster payload size in bytes
    pub cluster_size: u32,
    /// Number of clusters in the data region
    pub cluster_count: u32,
    /// Byte offset of the FAT
    pub fat_start_address: u32,
    /// Byte offset of the data region (root directory cluster)
    pub data_start_address: u32,
}

impl Superblock {
    /// Signature identifying a formatted image, NUL terminator included
    pub const SIGNATURE: [u8; 9] = *b"zapped99\0";

    /// Serialized size in bytes
    pub const SIZE: usize = 29;

    /// Bytes occupied by the FAT
    pub fn fat_size(&self) -> u32 {
        self.cluster_count * FAT_CELL_SIZE
    }

    /// Byte address of the root directory cluster
    pub fn root_address(&self) -> u32 {
        self.data_start_address
    }

    /// Serialize to the on-disk layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..9].copy_from_slice(&Self::SIGNATURE);
        bytes[9..13].copy_from_slice(&self.disk_size.to_le_bytes());
        bytes[13..17].copy_from_slice(&self.cluster_size.to_le_bytes());
        bytes[17..21].copy_from_slice(&self.cluster_count.to_le_bytes());
        bytes[21..25].copy_from_slice(&self.fat_start_address.to_le_bytes());
        bytes[25..29].copy_from_slice(&self.data_start_address.to_le_bytes());
        bytes
    }

    /// Parse from the on-disk layout
    ///
    /// # Errors
    ///
    /// Returns a corrupted-volume error if the slice is short or the
    /// signature does not match.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::corrupted("superblock too short"));
        }
        if bytes[0..9] != Self::SIGNATURE {
            return Err(Error::corrupted("bad superblock signature"));
        }

        Ok(Self {
            disk_size: u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]),
            cluster_size: u32::from_le_bytes([bytes[13], bytes[14], bytes[15], bytes[16]]),
            cluster_count: u32::from_le_bytes([bytes[17], bytes[18], bytes[19], bytes[20]]),
            fat_start_address: u32::from_le_bytes([bytes[21], bytes[22], bytes[23], bytes[24]]),
            data_start_address: u32::from_le_bytes([bytes[25], bytes[26], bytes[27], bytes[28]]),
        })
    }
}

/// One directory slot (21 bytes on disk)
///
/// `start_cluster` is the byte address of the item's first cluster; a zero
/// address marks the slot empty, since no item can ever start at offset 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Item name, at most [`DirectoryEntry::NAME_LENGTH`] - 1 bytes
    pub name: String,
    /// Directory flag
    pub is_directory: bool,
    /// File size in bytes (0 for directories)
    pub size: u32,
    /// Byte address of the first cluster
    pub start_cluster: u32,
}

impl DirectoryEntry {
    /// Serialized size in bytes
    pub const SIZE: usize = 21;

    /// Name field width on disk, NUL terminator included
    pub const NAME_LENGTH: usize = 12;

    /// Create a file entry; the name is truncated to the slot width
    pub fn file(name: &str, size: u32, start_cluster: u32) -> Self {
        Self {
            name: truncate_name(name),
            is_directory: false,
            size,
            start_cluster,
        }
    }

    /// Create a directory entry; the name is truncated to the slot width
    pub fn directory(name: &str, start_cluster: u32) -> Self {
        Self {
            name: truncate_name(name),
            is_directory: true,
            size: 0,
            start_cluster,
        }
    }

    /// True for an unoccupied slot
    pub fn is_empty_slot(&self) -> bool {
        self.start_cluster == 0
    }

    /// Serialize to the on-disk layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let name = self.name.as_bytes();
        let used = name.len().min(Self::NAME_LENGTH - 1);
        bytes[..used].copy_from_slice(&name[..used]);
        bytes[12] = self.is_directory as u8;
        bytes[13..17].copy_from_slice(&self.size.to_le_bytes());
        bytes[17..21].copy_from_slice(&self.start_cluster.to_le_bytes());
        bytes
    }

    /// Parse from the on-disk layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::corrupted("directory entry too short"));
        }

        let name_end = bytes[..Self::NAME_LENGTH]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::NAME_LENGTH - 1);
        let name = String::from_utf8_lossy(&bytes[..name_end]).into_owned();

        Ok(Self {
            name,
            is_directory: bytes[12] != 0,
            size: u32::from_le_bytes([bytes[13], bytes[14], bytes[15], bytes[16]]),
            start_cluster: u32::from_le_bytes([bytes[17], bytes[18], bytes[19], bytes[20]]),
        })
    }
}

fn truncate_name(name: &str) -> String {
    let mut end = name.len().min(DirectoryEntry::NAME_LENGTH - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// One line of a directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Item name
    pub name: String,
    /// Directory flag
    pub is_directory: bool,
    /// Size in bytes (0 for directories)
    pub size: u32,
    /// Byte address of the first cluster
    pub start_cluster: u32,
}

impl From<&DirectoryEntry> for EntryInfo {
    fn from(entry: &DirectoryEntry) -> Self {
        Self {
            name: entry.name.clone(),
            is_directory: entry.is_directory,
            size: entry.size,
            start_cluster: entry.start_cluster,
        }
    }
}

impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_directory { "<DIR>" } else { "<FILE>" };
        write!(
            f,
            "{} {} {}B {}",
            self.name, tag, self.size, self.start_cluster
        )
    }
}

/// Full description of one item, chain included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Item name
    pub name: String,
    /// Directory flag
    pub is_directory: bool,
    /// Size in bytes
    pub size: u32,
    /// Byte address of the first cluster
    pub start_cluster: u32,
    /// Cluster indices of the chain, in chain order
    pub clusters: Vec<u32>,
}

/// Parse a decimal size with an optional `KB`/`MB`/`GB` suffix
///
/// Returns `None` for anything that is not `<digits>[KB|MB|GB]`.
pub fn parse_size_spec(spec: &str) -> Option<u64> {
    let spec = spec.trim();
    let digits_end = spec
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(spec.len());
    if digits_end == 0 {
        return None;
    }

    let value: u64 = spec[..digits_end].parse().ok()?;
    let scale = match &spec[digits_end..] {
        "" => 1,
        "KB" => KB,
        "MB" => MB,
        "GB" => GB,
        _ => return None,
    };

    value.checked_mul(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fat_cell_raw_mapping() {
        assert_eq!(FatCell::from_raw(-1), FatCell::Free);
        assert_eq!(FatCell::from_raw(-2), FatCell::EndOfChain);
        assert_eq!(FatCell::from_raw(-3), FatCell::Bad);
        assert_eq!(FatCell::from_raw(-4), FatCell::Reserved);
        assert_eq!(FatCell::from_raw(4105), FatCell::Next(4105));

        assert_eq!(FatCell::Next(4105).to_raw(), 4105);
        assert_eq!(FatCell::Free.to_raw(), -1);
    }

    #[test]
    fn test_fat_cell_display() {
        assert_eq!(FatCell::Free.to_string(), "FREE");
        assert_eq!(FatCell::EndOfChain.to_string(), "EOF");
        assert_eq!(FatCell::Bad.to_string(), "BAD");
        assert_eq!(FatCell::Next(2048).to_string(), "2048");
    }

    #[test]
    fn test_superblock_roundtrip() {
        let superblock = Superblock {
            disk_size: 1_048_576,
            cluster_size: 1024,
            cluster_count: 1019,
            fat_start_address: 29,
            data_start_address: 4105,
        };

        let bytes = superblock.to_bytes();
        assert_eq!(bytes.len(), Superblock::SIZE);
        assert_eq!(&bytes[0..9], b"zapped99\0");

        let parsed = Superblock::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, superblock);
        assert_eq!(parsed.fat_size(), 1019 * 4);
        assert_eq!(parsed.root_address(), 4105);
    }

    #[test]
    fn test_superblock_rejects_bad_signature() {
        let superblock = Superblock {
            disk_size: 4096,
            cluster_size: 1024,
            cluster_count: 3,
            fat_start_address: 29,
            data_start_address: 41,
        };

        let mut bytes = superblock.to_bytes();
        bytes[0] = b'x';
        assert!(Superblock::from_bytes(&bytes).is_err());
        assert!(Superblock::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn test_directory_entry_roundtrip() {
        let entry = DirectoryEntry::file("notes.txt", 2500, 5129);
        let bytes = entry.to_bytes();
        assert_eq!(bytes.len(), DirectoryEntry::SIZE);

        let parsed = DirectoryEntry::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.name, "notes.txt");
        assert!(!parsed.is_directory);
        assert_eq!(parsed.size, 2500);
        assert_eq!(parsed.start_cluster, 5129);
    }

    #[test]
    fn test_directory_entry_name_truncation() {
        let entry = DirectoryEntry::directory("averylongdirectoryname", 4105);
        assert_eq!(entry.name.len(), DirectoryEntry::NAME_LENGTH - 1);

        let parsed = DirectoryEntry::from_bytes(&entry.to_bytes()).unwrap();
        assert_eq!(parsed.name, "averylongdi");
        assert!(parsed.is_directory);
    }

    #[test]
    fn test_directory_entry_empty_slot() {
        let parsed = DirectoryEntry::from_bytes(&[0u8; DirectoryEntry::SIZE]).unwrap();
        assert!(parsed.is_empty_slot());
        assert_eq!(parsed.name, "");
    }

    #[test]
    fn test_entry_info_display() {
        let dir = EntryInfo {
            name: "docs".to_string(),
            is_directory: true,
            size: 0,
            start_cluster: 5129,
        };
        assert_eq!(dir.to_string(), "docs <DIR> 0B 5129");

        let file = EntryInfo {
            name: "a.bin".to_string(),
            is_directory: false,
            size: 2500,
            start_cluster: 6153,
        };
        assert_eq!(file.to_string(), "a.bin <FILE> 2500B 6153");
    }

    #[test]
    fn test_parse_size_spec() {
        assert_eq!(parse_size_spec("1048576"), Some(1_048_576));
        assert_eq!(parse_size_spec("4KB"), Some(4096));
        assert_eq!(parse_size_spec("1MB"), Some(1_048_576));
        assert_eq!(parse_size_spec("2GB"), Some(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size_spec(" 8KB "), Some(8192));

        assert_eq!(parse_size_spec(""), None);
        assert_eq!(parse_size_spec("KB"), None);
        assert_eq!(parse_size_spec("12TB"), None);
        assert_eq!(parse_size_spec("12 KB"), None);
    }
}
