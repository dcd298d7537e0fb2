//! # DICOM-montage library
//!
//! This crate unpacks a scanner export of DICOM series and renders one
//! preview image per series.

//!
//! A scanner export is a `.tar.gz` (or `.tar.bz2`) archive holding one
//! directory per series. Slice files in different series often share names,
//! so they collide once merged into one folder. Processing an archive runs
//! these stages, one series after another:
//!  - Extraction into `tmpDICOM/` next to the archive
//!  - Enumeration of the series directories, in name order
//!  - Disambiguation: the series tag in the directory name (`__E5` in
//!    `Scan__E5`) is appended to every slice file name, so `MRIm01.dcm`
//!    becomes `MRIm01__E5.dcm`. Already tagged files are left alone.
//!  - Loading of all slices into one volume
//!  - Tiling of the volume into a grid, scaled to 8 bits by its maximum
//!  - Writing `<series>_montage.png` next to the series directory
//!
//!  A series that fails at any stage is logged and skipped; the others are
//!  still processed. Only a failed extraction stops the run.
//!
//! # Examples
//!
//! ## Processing an archive
//!
//! ```no_run
//! # use dicom_montage::{Pipeline, PipelineConfig};
//! # use std::path::Path;
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let report = pipeline
//!     .run(Path::new("study.tar.gz"))
//!     .expect("should have extracted the archive");
//! for (series, summary) in report.succeeded() {
//!     println!("{series}: {}", summary.montage.display());
//! }
//! ```
//!
//! ## Building a montage from a single directory
//!
//! ```no_run
//! # use dicom_montage::{VolumeLoader, SortBy, build_montage, MontageOptions};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let montage = build_montage(&volume, &MontageOptions::default());
//! montage.image.save("montage.png").expect("should have saved montage");
//! ```

pub mod archive;
pub mod enums;
pub mod error;
pub mod montage;
pub mod output;
pub mod pipeline;
pub mod series;
pub mod volume;
pub mod volume_loader;

pub use archive::{extract, split_ext};
pub use enums::{Compression, Fill, SortBy};
pub use error::{DecodeError, Error, ExtractionError, Result};
pub use montage::{Montage, MontageOptions, build_montage};
pub use output::{NoPreview, PreviewSink, SystemViewer, write_montage};
pub use pipeline::{Pipeline, PipelineConfig, RunReport, SeriesReport, SeriesSummary};
pub use series::{TagMatcher, disambiguate, list_series};
pub use volume::Volume;
pub use volume_loader::VolumeLoader;
