use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{path}: unsupported archive extension (expected .tar.gz or .tar.bz2)")]
    UnsupportedExtension { path: PathBuf },

    #[error("{path}: archive does not exist")]
    Missing { path: PathBuf },

    #[error("{path}: not a valid {kind} archive")]
    NotAnArchive { path: PathBuf, kind: &'static str },

    #[error("{path}: I/O error while extracting: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{dir}: no image slices found")]
    NoImages { dir: PathBuf },

    #[error("{path}: DICOM error: {source}")]
    Dicom {
        path: PathBuf,
        #[source]
        source: dicom::object::ReadError,
    },

    #[error("{path}: cannot decode pixel data: {message}")]
    PixelData { path: PathBuf, message: String },

    #[error(
        "{path}: inconsistent image dimensions, expected {expected:?} but found {found:?}"
    )]
    InconsistentDimensions {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("{path}: directory not found")]
    NotFound { path: PathBuf },

    #[error("cannot rename {from} to {to}: target already exists")]
    RenameCollision { from: PathBuf, to: PathBuf },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{path}: cannot write montage: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
