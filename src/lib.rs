//! Geometry core for tile-based map renderers.
//!
//! Two independent components:
//!
//! * [`mercator`]: spherical Mercator conversions between geographic,
//!   projected, pixel and tile-index coordinates, TMS/XYZ row flipping and
//!   quad keys.
//! * [`earcut`]: a port of the [Earcut](https://github.com/mapbox/earcut)
//!   ear-clipping triangulator with hole support and a z-order index for
//!   large rings.
//!
//! A typical caller projects a feature's rings into a tile-local frame with
//! [`GlobalMercator`], flattens them and hands the buffer to [`Earcut`].
//!
//! ```
//! use tilecut::{flatten, triangulate, GlobalMercator, TileScheme};
//!
//! let mercator = GlobalMercator::default();
//! let tile = mercator.tile_bounds(0, 0, 1, TileScheme::Xyz);
//! let ring: Vec<[f64; 2]> = [[10.0, 10.0], [10.0, 20.0], [20.0, 20.0]]
//!     .iter()
//!     .map(|&[lat, lon]| {
//!         let [x, y] = mercator.lat_lon_to_meters(lat, lon);
//!         [x - tile.min[0], y - tile.min[1]]
//!     })
//!     .collect();
//!
//! let flat = flatten(&[ring]);
//! let triangles = triangulate(&flat.vertices, &flat.hole_indices, flat.dim).unwrap();
//! assert_eq!(triangles.len(), 3);
//! ```

#![no_std]

extern crate alloc;

pub mod earcut;
pub mod error;
pub mod mercator;

pub use earcut::{deviation, flatten, triangulate, Earcut, Flattened, Index};
pub use error::{MercatorError, TriangulateError};
pub use mercator::{
    flip_tile_y, quad_key, quad_key_to_tile, tile_index_scheme_convert, Bounds, GlobalMercator,
    Tile, TileScheme, EARTH_RADIUS, MAX_TILE_ZOOM, MAX_ZOOM_LEVEL, TILE_SIZE,
};
