use ndarray::{Array2, Array3, ArrayView2, s};

/// Decoded pixel stack of one series, frames along the first axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Volume {
    pub data: Array3<f32>,
}

impl Volume {
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Wrap a single 2D frame.
    pub fn from_plane(plane: Array2<f32>) -> Self {
        Self {
            data: plane.insert_axis(ndarray::Axis(0)),
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    /// A volume with exactly one frame is a plain 2D image.
    pub fn is_planar(&self) -> bool {
        self.depth() == 1
    }

    pub fn frame(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        (index < self.depth()).then(|| self.data.slice(s![index, .., ..]))
    }

    /// Largest pixel value, or 0 for an empty volume.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    pub fn mean(&self) -> f32 {
        self.data.mean().unwrap_or(0.0)
    }
}
