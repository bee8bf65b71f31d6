//! # ZapFS Core
//!
//! Error handling, on-disk records, and shared constants for the zapfs
//! pseudo-FAT volume.
//!
//! The on-disk format is a flat byte file split into three regions:
//! superblock, FAT, data. FAT cells chain data clusters by *byte address*
//! (not cluster index); directory clusters hold fixed-width 21-byte entry
//! slots with `.` and `..` always in the first two occupied slots.

pub mod error;
pub mod types;

// Re-export commonly used items
pub use error::{Error, Result};
pub use types::{
    parse_size_spec, DirectoryEntry, EntryInfo, FatCell, FileReport, Superblock,
    DEFAULT_CLUSTER_SIZE, FAT_CELL_SIZE, GB, KB, MB,
};
