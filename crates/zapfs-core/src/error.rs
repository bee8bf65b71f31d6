//! Volume error types

use thiserror::Error;

/// The main error type for pseudo-FAT volume operations
///
/// The `Display` form of each taxonomy variant is the exact user-facing
/// error string minus the `ERROR: ` prefix; the shell prepends the prefix.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error against the backing image or the host file system
    #[error("IMAGE I/O FAILED ({0})")]
    Io(#[from] std::io::Error),

    /// Named file does not exist at the resolved location
    #[error("FILE NOT FOUND")]
    FileNotFound,

    /// Named directory does not exist at the resolved location
    #[error("DIR NOT FOUND")]
    DirNotFound,

    /// An intermediate path component could not be resolved
    #[error("PATH NOT FOUND")]
    PathNotFound,

    /// Destination file name is already taken
    #[error("FILE ALREADY EXISTS")]
    FileAlreadyExists,

    /// Destination directory name is already taken
    #[error("DIR ALREADY EXISTS")]
    DirAlreadyExists,

    /// A file operation was applied to a directory
    #[error("IS DIR")]
    IsDirectory,

    /// A directory operation was applied to a file
    #[error("IS NOT DIR")]
    NotADirectory,

    /// Directory still holds entries beyond `.` and `..`
    #[error("DIR IS NOT EMPTY")]
    DirNotEmpty,

    /// No free cluster, or no free slot in the target directory
    #[error("NO SPACE")]
    NoSpace,

    /// Refusal to remove `.`
    #[error("CANNOT REMOVE CURRENT DIR")]
    CannotRemoveCurrentDir,

    /// The image carries no valid superblock yet
    #[error("VOLUME IS NOT FORMATTED")]
    NotFormatted,

    /// The on-disk state violates the volume invariants
    #[error("CORRUPTED VOLUME ({0})")]
    Corrupted(String),
}

/// Result type alias for volume operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a corrupted-volume error
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Error::Corrupted(msg.into())
    }
}
