use crate::{
    archive::extract,
    enums::SortBy,
    error::{Error, Result},
    montage::{MontageOptions, build_montage},
    output::{NoPreview, PreviewSink, write_montage},
    series::{TagMatcher, disambiguate, list_series},
    volume_loader::VolumeLoader,
};

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

/// Supplies the archive to process.
pub trait ArchiveProvider {
    fn archive_path(&mut self) -> io::Result<PathBuf>;
}

impl ArchiveProvider for PathBuf {
    fn archive_path(&mut self) -> io::Result<PathBuf> {
        Ok(self.clone())
    }
}

/// Asks for the archive path on an interactive stream.
pub struct PathPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PathPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ArchiveProvider for PathPrompt<R, W> {
    fn archive_path(&mut self) -> io::Result<PathBuf> {
        write!(self.output, "DICOM archive (.tar.gz or .tar.bz2): ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let path = line.trim().trim_matches(|c| c == '"' || c == '\'');
        if path.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no archive path given",
            ));
        }
        Ok(PathBuf::from(path))
    }
}

#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    pub tag_matcher: TagMatcher,
    pub sort_by: SortBy,
    pub montage: MontageOptions,
}

/// What one series produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesSummary {
    pub tag: String,
    pub renamed: usize,
    pub frames: usize,
    pub grid: (usize, usize),
    pub montage: PathBuf,
}

#[derive(Debug)]
pub struct SeriesReport {
    pub name: String,
    pub outcome: Result<SeriesSummary>,
}

#[derive(Debug)]
pub struct RunReport {
    pub root: PathBuf,
    pub series: Vec<SeriesReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &SeriesSummary)> {
        self.series.iter().filter_map(|report| {
            report
                .outcome
                .as_ref()
                .ok()
                .map(|summary| (report.name.as_str(), summary))
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.series.iter().filter_map(|report| {
            report
                .outcome
                .as_ref()
                .err()
                .map(|error| (report.name.as_str(), error))
        })
    }
}

/// Extract, tag, load, tile and write, one series at a time.
pub struct Pipeline<P = NoPreview> {
    config: PipelineConfig,
    preview: P,
}

impl Pipeline<NoPreview> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            preview: NoPreview,
        }
    }
}

impl<P: PreviewSink> Pipeline<P> {
    pub fn with_preview<Q: PreviewSink>(self, preview: Q) -> Pipeline<Q> {
        Pipeline {
            config: self.config,
            preview,
        }
    }

    /// Run on the archive named by `provider`.
    pub fn run_with(&self, provider: &mut impl ArchiveProvider) -> Result<RunReport> {
        let archive = provider
            .archive_path()
            .map_err(|source| Error::io("<archive path>", source))?;
        self.run(&archive)
    }

    /// Extract `archive` and process every series inside it.
    ///
    /// # Errors
    ///
    /// Only extraction and enumeration failures are returned. A failing
    /// series is logged and recorded in the report; the remaining series are
    /// still processed.
    pub fn run(&self, archive: &Path) -> Result<RunReport> {
        let root = extract(archive)?;
        self.process_root(&root)
    }

    /// Process every series directory below an already extracted `root`.
    pub fn process_root(&self, root: &Path) -> Result<RunReport> {
        let names = list_series(root)?;
        info!(root = %root.display(), series = names.len(), "processing series");

        let series = names
            .into_iter()
            .map(|name| {
                let outcome = self.process_series(&root.join(&name));
                if let Err(e) = &outcome {
                    error!(series = %name, error = %e, "skipping series");
                }
                SeriesReport { name, outcome }
            })
            .collect();

        Ok(RunReport {
            root: root.to_path_buf(),
            series,
        })
    }

    /// Tag, load, tile and write a single series directory.
    pub fn process_series(&self, series_dir: &Path) -> Result<SeriesSummary> {
        let tagged = disambiguate(series_dir, &self.config.tag_matcher)?;
        let volume = VolumeLoader::load_from_directory(series_dir, self.config.sort_by)?;
        let montage = build_montage(&volume, &self.config.montage);
        let path = write_montage(&montage, series_dir)?;

        if let Err(e) = self.preview.preview(&montage.image, &path) {
            warn!(path = %path.display(), error = %e, "preview failed");
        }

        Ok(SeriesSummary {
            tag: tagged.tag,
            renamed: tagged.renamed,
            frames: volume.depth(),
            grid: montage.grid,
            montage: path,
        })
    }
}
