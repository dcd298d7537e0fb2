use crate::{
    archive::split_ext,
    error::{Error, Result},
};

use regex::Regex;
use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, info};

/// Scan number marker written by the scanner into series directory names,
/// e.g. `Scan__E5`.
pub const DEFAULT_TAG_PATTERN: &str = r"__E\d+";

static DEFAULT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_TAG_PATTERN).expect("Invalid regex"));

/// Finds series tags in directory and file names.
#[derive(Clone, Debug)]
pub struct TagMatcher {
    regex: Regex,
}

impl Default for TagMatcher {
    fn default() -> Self {
        Self {
            regex: DEFAULT_TAG.clone(),
        }
    }
}

impl TagMatcher {
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// First tag found in `name`, or the empty string.
    pub fn tag<'a>(&self, name: &'a str) -> &'a str {
        self.regex.find(name).map_or("", |m| m.as_str())
    }

    pub fn is_tagged(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Names of the series directories below `root`, sorted lexicographically.
///
/// Plain files at the root, such as previously written montages, are ignored.
pub fn list_series(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::NotFound {
            path: root.to_path_buf(),
        },
        _ => Error::io(root, source),
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::io(root, source))?;
        let is_dir = entry
            .file_type()
            .map_err(|source| Error::io(entry.path(), source))?
            .is_dir();
        if !is_dir {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => debug!(?name, "skipping series directory with non UTF-8 name"),
        }
    }
    names.sort();

    Ok(names)
}

/// Visible regular files directly inside `dir`, sorted by name.
pub(crate) fn slice_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = visible_files(dir)?;
    paths.sort();
    Ok(paths)
}

/// Visible regular files directly inside `dir`, in directory order.
pub(crate) fn visible_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::NotFound {
            path: dir.to_path_buf(),
        },
        _ => Error::io(dir, source),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::io(dir, source))?;
        let is_file = entry
            .file_type()
            .map_err(|source| Error::io(entry.path(), source))?
            .is_file();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if is_file && !hidden {
            paths.push(entry.path());
        }
    }

    Ok(paths)
}

/// Outcome of tagging one series directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disambiguation {
    pub tag: String,
    pub renamed: usize,
    pub skipped: usize,
}

/// Append the series tag of `series_dir` to every untagged file inside it.
///
/// Files whose names already carry a tag are left alone, so running this
/// twice gives the same result as running it once. All renames are planned
/// before any is performed: if one target already exists the directory is
/// left untouched and [`Error::RenameCollision`] is returned.
pub fn disambiguate(series_dir: &Path, matcher: &TagMatcher) -> Result<Disambiguation> {
    let dir_name = series_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tag = matcher.tag(&dir_name).to_string();

    let mut outcome = Disambiguation {
        tag: tag.clone(),
        ..Default::default()
    };

    let mut plan = Vec::new();
    let mut targets = HashSet::new();
    for path in slice_files(series_dir)? {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            outcome.skipped += 1;
            continue;
        };
        if matcher.is_tagged(name) || tag.is_empty() {
            outcome.skipped += 1;
            continue;
        }

        let (base, ext) = split_ext(name);
        let target = series_dir.join(format!("{base}{tag}{ext}"));
        if target.exists() || !targets.insert(target.clone()) {
            return Err(Error::RenameCollision {
                from: path,
                to: target,
            });
        }
        plan.push((path, target));
    }

    for (from, to) in plan {
        fs::rename(&from, &to).map_err(|source| Error::io(&from, source))?;
        outcome.renamed += 1;
    }

    info!(
        series = %dir_name,
        tag = %outcome.tag,
        renamed = outcome.renamed,
        skipped = outcome.skipped,
        "disambiguated file names"
    );

    Ok(outcome)
}
