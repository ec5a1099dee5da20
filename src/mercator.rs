//! Spherical Mercator (EPSG:3857) tile coordinates.
//!
//! Conversions between four coordinate spaces:
//!
//! * geographic `[lat, lon]` in degrees,
//! * projected `[x, y]` in meters, origin at lat/lon `(0, 0)`,
//! * pixels `[px, py]` at a zoom level, origin bottom-left,
//! * tile indices `(tx, ty)` at a zoom level, in either [`TileScheme`].
//!
//! Every conversion is a pure function of its arguments and the
//! [`GlobalMercator`] grid parameters.

use alloc::string::String;
use core::f64::consts::PI;

use num_traits::float::Float;

use crate::error::MercatorError;

/// Default tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Radius of the spherical earth model in meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Highest zoom level probed by [`GlobalMercator::zoom_for_pixel_size`].
pub const MAX_ZOOM_LEVEL: u8 = 29;

/// Highest zoom level whose tile indices fit in an `i64`.
pub const MAX_TILE_ZOOM: u8 = 62;

/// Tile row addressing convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileScheme {
    /// Origin bottom-left, rows increase northwards.
    #[default]
    Tms,
    /// Origin top-left, rows increase southwards (Google, OSM).
    Xyz,
}

impl TileScheme {
    /// Row index of `ty` (in this scheme) expressed in the TMS scheme.
    pub fn to_tms(self, ty: i64, zoom: u8) -> i64 {
        match self {
            TileScheme::Tms => ty,
            TileScheme::Xyz => flip_tile_y(ty, zoom),
        }
    }

    /// Row index of `ty` (in this scheme) expressed in the XYZ scheme.
    pub fn to_xyz(self, ty: i64, zoom: u8) -> i64 {
        match self {
            TileScheme::Tms => flip_tile_y(ty, zoom),
            TileScheme::Xyz => ty,
        }
    }
}

/// Axis-aligned rectangle, `min` componentwise no greater than `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn contains(&self, [x, y]: [f64; 2]) -> bool {
        x >= self.min[0] && x <= self.max[0] && y >= self.min[1] && y <= self.max[1]
    }
}

/// Spherical Mercator grid parameters.
///
/// ```
/// use tilecut::GlobalMercator;
///
/// let mercator = GlobalMercator::default();
/// assert_eq!(mercator.lat_lon_to_meters(0.0, 0.0), [0.0, 0.0]);
/// assert_eq!(mercator.resolution(1), mercator.resolution(0) / 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalMercator {
    tile_size: u32,
    earth_radius: f64,
}

impl Default for GlobalMercator {
    fn default() -> Self {
        Self::new(TILE_SIZE)
    }
}

impl GlobalMercator {
    pub const fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            earth_radius: EARTH_RADIUS,
        }
    }

    /// Same grid on a sphere of a different radius.
    pub const fn with_earth_radius(self, earth_radius: f64) -> Self {
        Self {
            earth_radius,
            ..self
        }
    }

    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub const fn earth_radius(&self) -> f64 {
        self.earth_radius
    }

    /// Half the equatorial circumference; the projected extent is `±origin_shift`.
    pub fn origin_shift(&self) -> f64 {
        PI * self.earth_radius
    }

    /// Meters per pixel at zoom 0.
    pub fn initial_resolution(&self) -> f64 {
        2.0 * PI * self.earth_radius / self.tile_size as f64
    }

    /// Meters per pixel at `zoom`.
    pub fn resolution(&self, zoom: u8) -> f64 {
        self.initial_resolution() / Float::powi(2f64, zoom as i32)
    }

    /// Width (and height) of the whole world in pixels at `zoom`.
    pub fn map_size(&self, zoom: u8) -> f64 {
        self.tile_size as f64 * Float::powi(2f64, zoom as i32)
    }

    /// Projects WGS84 latitude/longitude to spherical Mercator meters.
    ///
    /// The projection diverges towards the poles: `|lat| == 90` yields an
    /// infinite `y` and `|lat| > 90` yields `NaN`. Use
    /// [`try_lat_lon_to_meters`](Self::try_lat_lon_to_meters) to reject such
    /// input instead.
    pub fn lat_lon_to_meters(&self, lat: f64, lon: f64) -> [f64; 2] {
        let x = lon * self.origin_shift() / 180.0;
        // sin() folds latitudes past the poles back onto the sphere
        if Float::abs(lat) > 90.0 {
            return [x, f64::NAN];
        }
        // ln(tan(pi/4 + lat/2)) written as atanh(sin(lat)), exact at the equator
        let y = Float::atanh(Float::sin(lat.to_radians())) * self.earth_radius;
        [x, y]
    }

    /// [`lat_lon_to_meters`](Self::lat_lon_to_meters) that rejects latitudes
    /// at or beyond the poles.
    pub fn try_lat_lon_to_meters(&self, lat: f64, lon: f64) -> Result<[f64; 2], MercatorError> {
        if lat.is_nan() || Float::abs(lat) >= 90.0 {
            return Err(MercatorError::LatitudeOutOfDomain { lat });
        }
        Ok(self.lat_lon_to_meters(lat, lon))
    }

    /// Inverse of [`lat_lon_to_meters`](Self::lat_lon_to_meters).
    pub fn meters_to_lat_lon(&self, mx: f64, my: f64) -> [f64; 2] {
        let lon = mx / self.origin_shift() * 180.0;
        let lat = Float::atan(Float::sinh(my / self.earth_radius)).to_degrees();
        [lat, lon]
    }

    /// Pixel coordinates (origin bottom-left) to meters.
    pub fn pixels_to_meters(&self, px: f64, py: f64, zoom: u8) -> [f64; 2] {
        let res = self.resolution(zoom);
        let shift = self.origin_shift();
        [px * res - shift, py * res - shift]
    }

    /// Meters to pixel coordinates (origin bottom-left).
    pub fn meters_to_pixels(&self, mx: f64, my: f64, zoom: u8) -> [f64; 2] {
        let res = self.resolution(zoom);
        let shift = self.origin_shift();
        [(mx + shift) / res, (my + shift) / res]
    }

    pub fn lat_lon_to_pixels(&self, lat: f64, lon: f64, zoom: u8) -> [f64; 2] {
        let [mx, my] = self.lat_lon_to_meters(lat, lon);
        self.meters_to_pixels(mx, my, zoom)
    }

    /// Moves the pixel origin from bottom-left to top-left.
    pub fn pixels_to_raster(&self, px: f64, py: f64, zoom: u8) -> [f64; 2] {
        [px, self.map_size(zoom) - py]
    }

    /// Tile covering the pixel, TMS scheme.
    ///
    /// A pixel coordinate lying exactly on a tile boundary belongs to the
    /// tile below/left of it, so `(0, 0)` maps to tile `(-1, -1)`.
    pub fn pixels_to_tile_index(&self, px: f64, py: f64) -> (i64, i64) {
        let size = self.tile_size as f64;
        let tx = Float::ceil(px / size) - 1.0;
        let ty = Float::ceil(py / size) - 1.0;
        (tx as i64, ty as i64)
    }

    /// Tile covering the projected point, TMS scheme.
    pub fn meters_to_tile(&self, mx: f64, my: f64, zoom: u8) -> (i64, i64) {
        let [px, py] = self.meters_to_pixels(mx, my, zoom);
        self.pixels_to_tile_index(px, py)
    }

    /// Projected bounds of a tile.
    pub fn tile_bounds(&self, tx: i64, ty: i64, zoom: u8, scheme: TileScheme) -> Bounds {
        let ty = scheme.to_tms(ty, zoom);
        let size = self.tile_size as f64;
        let (x0, y0) = (tx as f64 * size, ty as f64 * size);
        Bounds {
            min: self.pixels_to_meters(x0, y0, zoom),
            max: self.pixels_to_meters(x0 + size, y0 + size, zoom),
        }
    }

    /// Geographic bounds of a tile; `min` and `max` hold `[lat, lon]`.
    pub fn tile_lat_lon_bounds(&self, tx: i64, ty: i64, zoom: u8, scheme: TileScheme) -> Bounds {
        let Bounds { min, max } = self.tile_bounds(tx, ty, zoom, scheme);
        Bounds {
            min: self.meters_to_lat_lon(min[0], min[1]),
            max: self.meters_to_lat_lon(max[0], max[1]),
        }
    }

    /// Maximal scale-down zoom level for a ground resolution of `pixel_size` meters.
    ///
    /// Returns the zoom just before the first one that is finer than
    /// `pixel_size`, or zoom 0 if even that is finer (never scales up).
    pub fn zoom_for_pixel_size(&self, pixel_size: f64) -> Result<u8, MercatorError> {
        (0..=MAX_ZOOM_LEVEL)
            .find(|&zoom| pixel_size > self.resolution(zoom))
            .map(|zoom| zoom.saturating_sub(1))
            .ok_or(MercatorError::PixelSizeTooSmall { pixel_size })
    }
}

/// Converts a tile row between the TMS and XYZ schemes.
///
/// The conversion is its own inverse.
///
/// # Panics
///
/// Panics if `zoom` exceeds [`MAX_TILE_ZOOM`].
pub fn flip_tile_y(ty: i64, zoom: u8) -> i64 {
    tiles_per_axis(zoom) - 1 - ty
}

/// Converts a tile index between the TMS and XYZ schemes.
pub fn tile_index_scheme_convert(tx: i64, ty: i64, zoom: u8) -> (i64, i64) {
    (tx, flip_tile_y(ty, zoom))
}

fn tiles_per_axis(zoom: u8) -> i64 {
    assert!(
        zoom <= MAX_TILE_ZOOM,
        "zoom level {zoom} exceeds the tile index range"
    );
    1 << zoom
}

/// Microsoft quad key of a tile.
///
/// Each digit is `x_bit + 2 * y_bit` with rows counted from the top, so
/// 0 = top-left, 1 = top-right, 2 = bottom-left and 3 = bottom-right.
/// The key has exactly `zoom` digits.
///
/// ```
/// use tilecut::{quad_key, TileScheme};
///
/// assert_eq!(quad_key(1, 0, 2, TileScheme::Xyz), "01");
/// assert_eq!(quad_key(1, 3, 2, TileScheme::Tms), "01");
/// ```
///
/// # Panics
///
/// Panics if `zoom` exceeds [`MAX_TILE_ZOOM`].
pub fn quad_key(tx: i64, ty: i64, zoom: u8, scheme: TileScheme) -> String {
    let ty = flip_tile_y(scheme.to_tms(ty, zoom), zoom);
    (1..=zoom)
        .rev()
        .map(|i| {
            let mask = 1 << (i - 1);
            let digit = u32::from(tx & mask != 0) + 2 * u32::from(ty & mask != 0);
            char::from(b'0' + digit as u8)
        })
        .collect()
}

/// Inverse of [`quad_key`]: the tile index in `scheme` and its zoom level.
pub fn quad_key_to_tile(key: &str, scheme: TileScheme) -> Result<(i64, i64, u8), MercatorError> {
    if key.len() > MAX_TILE_ZOOM as usize {
        return Err(MercatorError::QuadKeyTooLong { len: key.len() });
    }
    let mut tx = 0i64;
    let mut ty = 0i64;
    let mut zoom = 0u8;
    for digit in key.chars() {
        let bits = match digit {
            '0'..='3' => digit as u32 - '0' as u32,
            _ => return Err(MercatorError::InvalidQuadKeyDigit { digit }),
        };
        zoom += 1;
        tx = tx << 1 | i64::from(bits & 1);
        ty = ty << 1 | i64::from(bits >> 1);
    }
    let ty = match scheme {
        TileScheme::Xyz => ty,
        TileScheme::Tms => flip_tile_y(ty, zoom),
    };
    Ok((tx, ty, zoom))
}

/// A tile index together with its zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub x: i64,
    pub y: i64,
    pub zoom: u8,
}

impl Tile {
    pub fn new(x: i64, y: i64, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// The same tile addressed in the other scheme.
    pub fn flip(&self) -> Self {
        Self {
            y: flip_tile_y(self.y, self.zoom),
            ..*self
        }
    }

    /// Get the parent tile (zoom - 1).
    pub fn parent(&self) -> Option<Tile> {
        if self.zoom == 0 {
            return None;
        }
        Some(Tile {
            x: self.x >> 1,
            y: self.y >> 1,
            zoom: self.zoom - 1,
        })
    }

    /// Get the four children tiles (zoom + 1), row by row.
    ///
    /// # Panics
    ///
    /// Panics if the children would exceed [`MAX_TILE_ZOOM`].
    pub fn children(&self) -> [Tile; 4] {
        assert!(
            self.zoom < MAX_TILE_ZOOM,
            "zoom level {} has no children in the tile index range",
            self.zoom
        );
        let (x, y, zoom) = (self.x * 2, self.y * 2, self.zoom + 1);
        [
            Tile { x, y, zoom },
            Tile { x: x + 1, y, zoom },
            Tile { x, y: y + 1, zoom },
            Tile {
                x: x + 1,
                y: y + 1,
                zoom,
            },
        ]
    }

    pub fn quad_key(&self, scheme: TileScheme) -> String {
        quad_key(self.x, self.y, self.zoom, scheme)
    }
}
