use crate::{
    error::{Error, Result},
    montage::Montage,
};

use image::GrayImage;
use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use tracing::info;

pub const MONTAGE_SUFFIX: &str = "_montage.png";

/// Where the montage of `series_dir` is written: next to the directory,
/// named after it.
pub fn montage_path(series_dir: &Path) -> PathBuf {
    let name = series_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    series_dir.with_file_name(format!("{name}{MONTAGE_SUFFIX}"))
}

/// Save `montage` as a PNG beside `series_dir` and return its path.
pub fn write_montage(montage: &Montage, series_dir: &Path) -> Result<PathBuf> {
    let path = montage_path(series_dir);
    montage
        .image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

    info!(
        path = %path.display(),
        width = montage.image.width(),
        height = montage.image.height(),
        "wrote montage"
    );
    Ok(path)
}

/// Best-effort display of a written montage.
///
/// Failures are reported to the caller, which logs them and moves on.
pub trait PreviewSink {
    fn preview(&self, image: &GrayImage, path: &Path) -> io::Result<()>;
}

/// Shows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPreview;

impl PreviewSink for NoPreview {
    fn preview(&self, _image: &GrayImage, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Opens the written file in the desktop's default image viewer.
///
/// Waits for the platform opener to return; the viewer it launches keeps
/// running on its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemViewer;

impl SystemViewer {
    fn command(path: &Path) -> Command {
        if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]).arg(path);
            command
        } else if cfg!(target_os = "macos") {
            let mut command = Command::new("open");
            command.arg(path);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        }
    }

    /// Run `command` to completion, mapping a failed exit to an error.
    fn open_with(mut command: Command) -> io::Result<()> {
        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("image viewer exited with {status}")))
        }
    }
}

impl PreviewSink for SystemViewer {
    fn preview(&self, _image: &GrayImage, path: &Path) -> io::Result<()> {
        Self::open_with(Self::command(path))
    }
}
