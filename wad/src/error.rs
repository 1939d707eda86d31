use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;

/// The broad category an error falls in to. Lets a host decide how to report
/// a failure without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong magic, wrong size, truncated data or a bad offset
    MalformedInput,
    /// An index in to another table is past its end
    OutOfRangeReference,
    /// More than one interpretation of the data is possible
    AmbiguousState,
    /// A named lump or map does not exist
    NotFound,
    /// The format is recognised but not supported
    UnimplementedFormat,
    /// Allocation failed
    ResourceExhaustion,
}

#[derive(Debug, Error)]
pub enum WadError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Smaller than a WAD header
    #[error("{wad}: {len} bytes is too small to be a WAD")]
    TooSmall { wad: String, len: usize },

    #[error("{wad}: invalid identification {ident:?}, expected IWAD or PWAD")]
    InvalidIdentification { wad: String, ident: [u8; 4] },

    #[error("{wad}: WAD contains no lumps")]
    Empty { wad: String },

    #[error("{wad}: invalid lump count {count}")]
    InvalidLumpCount { wad: String, count: i32 },

    #[error("{wad}: invalid directory offset {offset}")]
    InvalidDirectoryOffset { wad: String, offset: i32 },

    /// The directory itself runs past the end of the file
    #[error("{wad}: directory of {count} entries at {offset} runs past end ({len} bytes)")]
    DirectoryOutOfBounds {
        wad: String,
        offset: usize,
        count: usize,
        len: usize,
    },

    #[error("{wad}: lump {name} at {offset} with size {size} exceeds WAD size {len}")]
    LumpOutOfBounds {
        wad: String,
        name: String,
        offset: i64,
        size: i64,
        len: usize,
    },

    /// A read past the end of a lump
    #[error("read of {wanted} bytes at offset {offset} overruns {len} byte lump")]
    Truncated {
        offset: usize,
        wanted: usize,
        len: usize,
    },

    #[error("lump {0} not found")]
    NotFound(String),

    #[error("lump index {index} out of range ({len} lumps)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

impl WadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            WadError::Io { .. }
            | WadError::TooSmall { .. }
            | WadError::InvalidIdentification { .. }
            | WadError::Empty { .. }
            | WadError::InvalidLumpCount { .. }
            | WadError::InvalidDirectoryOffset { .. }
            | WadError::DirectoryOutOfBounds { .. }
            | WadError::LumpOutOfBounds { .. }
            | WadError::Truncated { .. } => ErrorKind::MalformedInput,
            WadError::NotFound(_) => ErrorKind::NotFound,
            WadError::IndexOutOfRange { .. } => ErrorKind::OutOfRangeReference,
            WadError::OutOfMemory(_) => ErrorKind::ResourceExhaustion,
        }
    }
}
