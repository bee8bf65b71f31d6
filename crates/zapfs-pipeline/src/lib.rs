//! # ZapFS Pipeline
//!
//! I/O abstraction for the zapfs volume: a random-access, byte-addressed
//! pipeline over the single backing image file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zapfs_pipeline::ImagePipeline;
//! use std::path::Path;
//!
//! let mut pipeline = ImagePipeline::open(Path::new("volume.dat")).unwrap();
//! let length = pipeline.len().unwrap();
//! ```

pub mod image;

pub use image::ImagePipeline;
