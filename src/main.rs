use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dicom_montage::{
    Fill, MontageOptions, Pipeline, PipelineConfig, SortBy, SystemViewer, TagMatcher,
    pipeline::{ArchiveProvider, PathPrompt},
    series::DEFAULT_TAG_PATTERN,
};

#[derive(Parser)]
#[command(name = "dicom-montage")]
#[command(about = "Unpack a DICOM series archive, tag slice names by series and write a montage per series")]
#[command(version)]
struct Cli {
    /// Archive to process (.tar.gz or .tar.bz2); asked for interactively when omitted
    #[arg(value_name = "ARCHIVE")]
    archive: Option<PathBuf>,

    /// Regular expression matching the series tag in directory names
    #[arg(long, default_value = DEFAULT_TAG_PATTERN)]
    tag_pattern: String,

    /// Order of frames within a series
    #[arg(long, value_enum, default_value_t = SortArg::FileName)]
    sort_by: SortArg,

    /// Fixed number of montage columns
    #[arg(long)]
    columns: Option<usize>,

    /// Value of empty montage cells
    #[arg(long, value_enum, default_value_t = FillArg::Mean)]
    fill: FillArg,

    /// Open every written montage in the system image viewer
    #[arg(long)]
    preview: bool,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    FileName,
    InstanceNumber,
    ImagePosition,
    TablePosition,
    None,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::FileName => SortBy::FileName,
            SortArg::InstanceNumber => SortBy::InstanceNumber,
            SortArg::ImagePosition => SortBy::ImagePositionPatient,
            SortArg::TablePosition => SortBy::TablePosition,
            SortArg::None => SortBy::None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FillArg {
    Mean,
    Zero,
}

impl From<FillArg> for Fill {
    fn from(arg: FillArg) -> Self {
        match arg {
            FillArg::Mean => Fill::Mean,
            FillArg::Zero => Fill::Value(0.0),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    let config = PipelineConfig {
        tag_matcher: TagMatcher::new(&cli.tag_pattern)
            .with_context(|| format!("invalid tag pattern {:?}", cli.tag_pattern))?,
        sort_by: cli.sort_by.into(),
        montage: MontageOptions {
            columns: cli.columns,
            fill: cli.fill.into(),
        },
    };

    let archive = match cli.archive {
        Some(mut path) => path.archive_path(),
        None => PathPrompt::new(io::stdin().lock(), io::stderr()).archive_path(),
    }
    .context("no archive to process")?;

    let pipeline = Pipeline::new(config);
    let report = if cli.preview {
        pipeline.with_preview(SystemViewer).run(&archive)
    } else {
        pipeline.run(&archive)
    }
    .with_context(|| format!("failed to process {}", archive.display()))?;

    println!("Extracted to {}", report.root.display());
    for (series, summary) in report.succeeded() {
        println!(
            "  {series}: tag {:?}, {} renamed, {} frames in {}x{} grid -> {}",
            summary.tag,
            summary.renamed,
            summary.frames,
            summary.grid.0,
            summary.grid.1,
            summary.montage.display()
        );
    }
    for (series, error) in report.failed() {
        println!("  {series}: skipped ({error})");
    }

    let ok = report.succeeded().count();
    if ok == 0 && !report.series.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
