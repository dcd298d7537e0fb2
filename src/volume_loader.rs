use crate::{
    enums::SortBy,
    error::{DecodeError, Result},
    series::{slice_files, visible_files},
    volume::Volume,
};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Frames decoded from one file, with the key used to order the file.
struct DecodedFile {
    path: PathBuf,
    order: Option<f32>,
    frames: Vec<Array2<f32>>,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load every visible file in `path` as one volume.
    ///
    /// With [`SortBy::None`] files keep the order the directory lists them in,
    /// which varies between file systems. Otherwise they are enumerated in
    /// lexicographic name order, which is the frame order for
    /// [`SortBy::FileName`]; the attribute variants reorder files by a DICOM
    /// attribute, keeping name order for ties and for files lacking it.
    ///
    /// # Errors
    ///
    /// Returns error if the directory is missing, holds no files, any file is
    /// not a decodable DICOM image, or frames differ in size.
    pub fn load_from_directory(path: impl AsRef<Path>, sort_by: SortBy) -> Result<Volume> {
        let dir = path.as_ref();
        let paths = match sort_by {
            SortBy::None => visible_files(dir)?,
            _ => slice_files(dir)?,
        };

        if paths.is_empty() {
            return Err(DecodeError::NoImages {
                dir: dir.to_path_buf(),
            }
            .into());
        }

        let volume = Self::load_from_file_paths(&paths, sort_by)?;
        info!(
            dir = %dir.display(),
            files = paths.len(),
            dim = ?volume.dim(),
            "loaded volume"
        );
        Ok(volume)
    }

    /// Load a volume from file paths, in the given order unless `sort_by`
    /// names a DICOM attribute.
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> std::result::Result<Volume, DecodeError> {
        let mut files = paths
            .iter()
            .map(|path| Self::decode_file(path.as_ref(), sort_by))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Self::sort_files(&mut files, sort_by);
        Self::validate_dimensions(&files)?;

        let frames: Vec<_> = files.iter().flat_map(|file| file.frames.iter()).collect();
        if frames.is_empty() {
            let dir = paths
                .first()
                .and_then(|path| path.as_ref().parent())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            return Err(DecodeError::NoImages { dir });
        }

        Ok(Volume::new(Self::build_volume_array(&frames)))
    }

    fn decode_file(path: &Path, sort_by: SortBy) -> std::result::Result<DecodedFile, DecodeError> {
        let dicom_object = open_file(path).map_err(|source| DecodeError::Dicom {
            path: path.to_path_buf(),
            source,
        })?;
        let frames = Self::decode_frames(&dicom_object, path)?;
        debug!(path = %path.display(), frames = frames.len(), "decoded slice file");

        Ok(DecodedFile {
            path: path.to_path_buf(),
            order: Self::get_sort_order(&dicom_object, sort_by),
            frames,
        })
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<f32> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                // Descending z, head first.
                pos.get(2).map(|z| -z)
            }
            SortBy::TablePosition => dicom_object
                .element(tags::TABLE_POSITION)
                .ok()?
                .to_float32()
                .ok(),
            SortBy::InstanceNumber => dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()?
                .to_int::<i32>()
                .ok()
                .map(|n| n as f32),
            SortBy::FileName | SortBy::None => None,
        }
    }

    /// Decode every frame of a file, first sample only, without the modality
    /// LUT so stored values reach the montage unchanged.
    fn decode_frames(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        path: &Path,
    ) -> std::result::Result<Vec<Array2<f32>>, DecodeError> {
        let pixel_error = |message: String| DecodeError::PixelData {
            path: path.to_path_buf(),
            message,
        };

        let pixel_data = dicom_object
            .decode_pixel_data()
            .map_err(|e| pixel_error(e.to_string()))?;
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let array = pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map_err(|e| pixel_error(e.to_string()))?;

        let frame_count = array.dim().0;
        Ok((0..frame_count)
            .map(|frame| array.slice(s![frame, .., .., 0]).to_owned())
            .collect())
    }

    fn sort_files(files: &mut [DecodedFile], sort_by: SortBy) {
        if matches!(sort_by, SortBy::FileName | SortBy::None) {
            return;
        }

        files.sort_by(|a, b| match (a.order, b.order) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    fn validate_dimensions(files: &[DecodedFile]) -> std::result::Result<(), DecodeError> {
        let Some(expected) = files
            .iter()
            .flat_map(|file| file.frames.first())
            .map(|frame| frame.dim())
            .next()
        else {
            return Ok(());
        };

        for file in files {
            if let Some(found) = file
                .frames
                .iter()
                .map(|frame| frame.dim())
                .find(|dim| *dim != expected)
            {
                return Err(DecodeError::InconsistentDimensions {
                    path: file.path.clone(),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    fn build_volume_array(frames: &[&Array2<f32>]) -> Array3<f32> {
        let (height, width) = frames[0].dim();
        let depth = frames.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, frame) in frames.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(*frame);
        }

        volume
    }
}
