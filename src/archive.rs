use crate::{enums::Compression, error::ExtractionError};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::{
    fs::{self, File},
    io::{self, BufReader, Read, Seek},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Name of the directory the archive is unpacked into, next to the archive.
pub const EXTRACTION_DIR: &str = "tmpDICOM";

impl Compression {
    fn label(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip tar",
            Compression::Bzip2 => "bzip2 tar",
        }
    }
}

/// Split a file name into base name and extension.
///
/// Compressed tarball extensions such as `.tar.gz` are kept whole. Any other
/// name splits at its last dot, ignoring leading dots, so `.hidden` has no
/// extension. `base + ext` always reproduces `name`.
pub fn split_ext(name: &str) -> (&str, &str) {
    let lower = name.to_ascii_lowercase();
    for (ext, _) in Compression::EXTENSIONS {
        if lower.len() > ext.len() && lower.ends_with(ext) {
            return name.split_at(name.len() - ext.len());
        }
    }

    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(dot) => name.split_at(stem_start + dot),
        None => (name, ""),
    }
}

/// Directory the contents of `archive_path` are unpacked into.
pub fn extraction_root(archive_path: &Path) -> PathBuf {
    archive_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(EXTRACTION_DIR)
}

/// Unpack a `.tar.gz` or `.tar.bz2` archive into [`extraction_root`].
///
/// Returns the directory holding the series directories. Archives exported
/// with their own top-level `tmpDICOM/` directory resolve to that inner
/// directory.
///
/// # Errors
///
/// Distinguishes a missing file, an unsupported extension, a file that is not
/// a valid archive of its declared kind, and I/O failures while unpacking.
pub fn extract(archive_path: &Path) -> Result<PathBuf, ExtractionError> {
    let compression = archive_path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(Compression::from_file_name)
        .ok_or_else(|| ExtractionError::UnsupportedExtension {
            path: archive_path.to_path_buf(),
        })?;

    let io_error = |source: io::Error| ExtractionError::Io {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut file = File::open(archive_path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ExtractionError::Missing {
            path: archive_path.to_path_buf(),
        },
        _ => io_error(source),
    })?;

    let mut header = Vec::with_capacity(compression.magic().len());
    (&mut file)
        .take(compression.magic().len() as u64)
        .read_to_end(&mut header)
        .map_err(io_error)?;
    if header != compression.magic() {
        return Err(ExtractionError::NotAnArchive {
            path: archive_path.to_path_buf(),
            kind: compression.label(),
        });
    }
    file.rewind().map_err(io_error)?;

    let root = extraction_root(archive_path);
    fs::create_dir_all(&root).map_err(io_error)?;
    info!(archive = %archive_path.display(), root = %root.display(), "extracting archive");

    let reader = BufReader::new(file);
    let decoder: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(GzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
    };

    tar::Archive::new(decoder)
        .unpack(&root)
        .map_err(|source| match source.kind() {
            io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::Other => {
                debug!(error = %source, "archive stream rejected");
                ExtractionError::NotAnArchive {
                    path: archive_path.to_path_buf(),
                    kind: compression.label(),
                }
            }
            _ => io_error(source),
        })?;

    Ok(unwrap_wrapper_dir(root))
}

fn unwrap_wrapper_dir(root: PathBuf) -> PathBuf {
    let Ok(entries) = fs::read_dir(&root) else {
        return root;
    };
    let entries: Vec<_> = entries.filter_map(Result::ok).collect();
    match entries.as_slice() {
        [only]
            if only.file_name() == EXTRACTION_DIR
                && only.file_type().is_ok_and(|kind| kind.is_dir()) =>
        {
            debug!("descending into wrapper directory {EXTRACTION_DIR}");
            only.path()
        }
        _ => root,
    }
}
