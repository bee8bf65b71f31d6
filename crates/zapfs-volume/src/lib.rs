//! # ZapFS Volume
//!
//! The pseudo-FAT volume engine: a hierarchical file system stored inside a
//! single host file, with a FAT chaining fixed-size data clusters.
//!
//! Layered bottom-up:
//! - FAT engine: one 32-bit cell per cluster, first-free scan, address ↔
//!   index translation ([`fat`])
//! - Cluster store: full-payload read/write/zero ([`cluster`])
//! - Directory layer: fixed-width entry slots per directory cluster ([`dir`])
//! - Path resolver: pure component-wise traversal ([`resolve`])
//! - Operations: create/remove/copy/move/import/export/defragment
//!   ([`ops`], [`transfer`], [`defrag`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zapfs_volume::Volume;
//!
//! let mut volume = Volume::open(Path::new("volume.dat")).unwrap();
//! volume.format(1024 * 1024).unwrap();
//! volume.mkdir("docs").unwrap();
//! ```

pub mod cluster;
pub mod defrag;
pub mod dir;
pub mod fat;
pub mod ops;
pub mod resolve;
pub mod transfer;
pub mod volume;

pub use volume::{Volume, WorkingDirectory};
