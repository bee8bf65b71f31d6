//! Byte-addressed pipeline over the backing image file
//!
//! Every other layer addresses storage exclusively through this wrapper;
//! offsets are absolute byte positions within the image.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Random-access pipeline over the image file.
///
/// Opens the backing file read/write and creates it empty when it does not
/// exist yet. No buffering beyond host OS semantics.
///
/// # Example
///
/// ```rust,no_run
/// use zapfs_pipeline::ImagePipeline;
/// use std::path::Path;
///
/// let mut pipeline = ImagePipeline::open(Path::new("volume.dat")).unwrap();
/// pipeline.write_at(0, b"zapped99").unwrap();
/// let bytes = pipeline.read_at(0, 8).unwrap();
/// assert_eq!(&bytes, b"zapped99");
/// ```
#[derive(Debug)]
pub struct ImagePipeline {
    file: File,
    path: PathBuf,
}

impl ImagePipeline {
    /// Open the image file, creating it empty when absent
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the backing file in bytes
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// True when the backing file holds no bytes yet
    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read exactly `len` bytes at the given offset
    pub fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Fill `buf` from the given offset
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }

    /// Write all of `bytes` at the given offset
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)
    }

    /// Truncate the backing file to zero bytes
    ///
    /// Backs a volume re-format: the whole image is rewritten afterwards.
    pub fn reset(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Flush pending writes to the host OS
    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
