use crate::{enums::Fill, volume::Volume};

use image::{GrayImage, ImageBuffer, Luma};
use ndarray::{Array2, s};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MontageOptions {
    /// Fixed number of grid columns, otherwise a near-square grid.
    pub columns: Option<usize>,
    pub fill: Fill,
}

/// A volume tiled and scaled to 8 bits.
#[derive(Clone, Debug)]
pub struct Montage {
    pub image: GrayImage,
    /// (rows, columns) of the tile grid.
    pub grid: (usize, usize),
}

/// Grid (rows, columns) holding `frames` tiles.
///
/// Without a fixed column count the grid has `ceil(sqrt(frames))` columns
/// and just enough rows, so fewer than one row of cells stays empty.
pub fn grid_shape(frames: usize, columns: Option<usize>) -> (usize, usize) {
    if frames == 0 {
        return (0, 0);
    }
    let columns = columns
        .unwrap_or_else(|| (frames as f64).sqrt().ceil() as usize)
        .clamp(1, frames);
    (frames.div_ceil(columns), columns)
}

/// Scale `value` so that `max` maps to 255, rounding to the nearest level.
///
/// A non-positive `max` yields 0 instead of dividing by zero.
#[inline]
pub fn normalize_to_u8(value: f32, max: f32) -> u8 {
    if max <= 0.0 || !max.is_finite() {
        return 0;
    }
    (value * 255.0 / max).round().clamp(0.0, 255.0) as u8
}

/// Tile all frames of `volume` row-major into one plane, in frame order.
///
/// A planar volume passes through unchanged.
pub fn tile(volume: &Volume, options: &MontageOptions) -> (Array2<f32>, (usize, usize)) {
    let (depth, height, width) = volume.dim();
    if volume.is_planar() {
        return (volume.data().slice(s![0, .., ..]).to_owned(), (1, 1));
    }

    let (rows, columns) = grid_shape(depth, options.columns);
    let fill = match options.fill {
        Fill::Mean => volume.mean(),
        Fill::Value(value) => value,
    };
    let mut plane = Array2::from_elem((rows * height, columns * width), fill);

    for index in 0..depth {
        let (row, column) = (index / columns, index % columns);
        let (top, left) = (row * height, column * width);
        plane
            .slice_mut(s![top..top + height, left..left + width])
            .assign(&volume.data().slice(s![index, .., ..]));
    }

    (plane, (rows, columns))
}

/// Tile `volume` and scale it by the volume's own maximum to the 0..=255 range.
pub fn build_montage(volume: &Volume, options: &MontageOptions) -> Montage {
    let (plane, grid) = tile(volume, options);
    let max = volume.max();
    let (height, width) = plane.dim();

    let image: GrayImage = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        Luma([normalize_to_u8(plane[[y as usize, x as usize]], max)])
    });

    Montage { image, grid }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    #[test]
    fn grid_is_near_square() {
        assert_eq!(grid_shape(0, None), (0, 0));
        assert_eq!(grid_shape(1, None), (1, 1));
        assert_eq!(grid_shape(2, None), (1, 2));
        assert_eq!(grid_shape(4, None), (2, 2));
        assert_eq!(grid_shape(5, None), (2, 3));
        assert_eq!(grid_shape(10, None), (3, 4));
        assert_eq!(grid_shape(16, None), (4, 4));
        assert_eq!(grid_shape(17, None), (4, 5));
    }

    #[test]
    fn fixed_columns_are_clamped_to_frame_count() {
        assert_eq!(grid_shape(6, Some(3)), (2, 3));
        assert_eq!(grid_shape(3, Some(10)), (1, 3));
        assert_eq!(grid_shape(3, Some(0)), (3, 1));
    }

    #[test]
    fn normalization_rounds_against_max() {
        assert_eq!(normalize_to_u8(0.0, 1000.0), 0);
        assert_eq!(normalize_to_u8(1000.0, 1000.0), 255);
        assert_eq!(normalize_to_u8(2.0, 3.0), 170);
        assert_eq!(normalize_to_u8(1.0, 2.0), 128);
        assert_eq!(normalize_to_u8(-40.0, 100.0), 0);
    }

    #[test]
    fn zero_max_normalizes_to_zero() {
        assert_eq!(normalize_to_u8(0.0, 0.0), 0);
        let volume = Volume::new(Array3::zeros((3, 2, 2)));
        let montage = build_montage(&volume, &MontageOptions::default());
        assert!(montage.image.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn planar_volume_passes_through() {
        let volume = Volume::from_plane(array![[0.0, 50.0, 100.0], [25.0, 75.0, 10.0]]);

        let montage = build_montage(&volume, &MontageOptions::default());

        assert_eq!(montage.grid, (1, 1));
        assert_eq!(montage.image.dimensions(), (3, 2));
        let expected = [0u8, 128, 255, 64, 191, 26];
        assert_eq!(montage.image.as_raw().as_slice(), &expected);
    }

    #[test]
    fn every_frame_is_placed_once_in_row_major_order() {
        let depth = 5;
        let data = Array3::from_shape_fn((depth, 2, 3), |(d, _, _)| (d + 1) as f32);
        let volume = Volume::new(data);
        let options = MontageOptions {
            columns: None,
            fill: Fill::Value(0.0),
        };

        let (plane, grid) = tile(&volume, &options);

        assert_eq!(grid, (2, 3));
        assert_eq!(plane.dim(), (4, 9));
        let mut seen = Vec::new();
        for row in 0..grid.0 {
            for column in 0..grid.1 {
                let cell = plane.slice(s![row * 2..row * 2 + 2, column * 3..column * 3 + 3]);
                let value = cell[[0, 0]];
                assert!(cell.iter().all(|v| *v == value));
                seen.push(value as usize);
            }
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn empty_cells_default_to_mean() {
        let volume = Volume::new(array![[[2.0]], [[4.0]], [[6.0]]]);

        let (plane, _) = tile(&volume, &MontageOptions::default());

        assert_eq!(plane, array![[2.0, 4.0], [6.0, 4.0]]);
    }

    #[test]
    fn montage_scales_by_volume_max() {
        let volume = Volume::new(array![[[0.0, 100.0]], [[200.0, 400.0]]]);

        let montage = build_montage(&volume, &MontageOptions::default());

        assert_eq!(montage.image.dimensions(), (4, 1));
        assert_eq!(montage.image.as_raw().as_slice(), &[0u8, 64, 128, 255]);
    }
}
