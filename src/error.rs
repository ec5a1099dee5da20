use thiserror::Error;

/// Errors reported by the coordinate conversions in [`crate::mercator`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MercatorError {
    /// Latitude at or beyond a pole, where the projection diverges.
    #[error("latitude {lat} is outside the projectable range (-90, 90)")]
    LatitudeOutOfDomain { lat: f64 },

    /// No zoom level in `0..=29` is coarse enough for the requested pixel size.
    #[error("pixel size {pixel_size} is finer than the highest supported zoom level")]
    PixelSizeTooSmall { pixel_size: f64 },

    #[error("invalid quad key digit {digit:?}")]
    InvalidQuadKeyDigit { digit: char },

    #[error("quad key of length {len} exceeds the deepest addressable zoom level")]
    QuadKeyTooLong { len: usize },
}

/// Errors reported for malformed triangulation input.
///
/// These describe the *shape* of the input buffers only. Poor geometry
/// (self-intersections, degenerate rings) never produces an error; the
/// triangulator returns whatever triangles it could construct instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangulateError {
    #[error("vertex dimension must be at least 2, got {dim}")]
    InvalidDimension { dim: usize },

    #[error("vertex buffer of length {len} is not a multiple of dimension {dim}")]
    RaggedVertices { len: usize, dim: usize },

    #[error("hole start {index} is beyond the number of points ({num_points})")]
    HoleIndexOutOfRange { index: usize, num_points: usize },

    #[error("hole start indices must be in ascending order")]
    UnsortedHoleIndices,
}
