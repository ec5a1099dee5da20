use approx::{assert_abs_diff_eq, assert_relative_eq};
use proptest::prelude::*;
use tilecut::{
    quad_key, quad_key_to_tile, tile_index_scheme_convert, GlobalMercator, MercatorError, Tile,
    TileScheme, MAX_ZOOM_LEVEL,
};

/// Latitude where the projected square world ends.
const MAX_LATITUDE: f64 = 85.05112877980659;

#[test]
fn test_origin_is_exact() {
    let mercator = GlobalMercator::default();
    assert_eq!(mercator.lat_lon_to_meters(0.0, 0.0), [0.0, 0.0]);
    assert_eq!(mercator.meters_to_lat_lon(0.0, 0.0), [0.0, 0.0]);
}

#[test]
fn test_world_corners() {
    let mercator = GlobalMercator::default();
    let shift = mercator.origin_shift();
    let [x, y] = mercator.lat_lon_to_meters(MAX_LATITUDE, 180.0);
    assert_relative_eq!(x, shift, max_relative = 1e-12);
    assert_relative_eq!(y, shift, max_relative = 1e-9);
    let [x, y] = mercator.lat_lon_to_meters(-MAX_LATITUDE, -180.0);
    assert_relative_eq!(x, -shift, max_relative = 1e-12);
    assert_relative_eq!(y, -shift, max_relative = 1e-9);
}

#[test]
fn test_known_city() {
    // Tokyo station
    let mercator = GlobalMercator::default();
    let [x, y] = mercator.lat_lon_to_meters(35.681236, 139.767125);
    assert_abs_diff_eq!(x, 15558805.18, epsilon = 0.1);
    assert_abs_diff_eq!(y, 4256848.12, epsilon = 0.1);
}

#[test]
fn test_poles_diverge() {
    let mercator = GlobalMercator::default();
    assert_eq!(mercator.lat_lon_to_meters(90.0, 0.0)[1], f64::INFINITY);
    assert_eq!(mercator.lat_lon_to_meters(-90.0, 0.0)[1], f64::NEG_INFINITY);
}

#[test]
fn test_beyond_poles_is_nan() {
    let mercator = GlobalMercator::default();
    let [x, y] = mercator.lat_lon_to_meters(100.0, 10.0);
    assert!(y.is_nan());
    assert_relative_eq!(x, mercator.lat_lon_to_meters(0.0, 10.0)[0]);
    assert!(mercator.lat_lon_to_meters(-90.5, 0.0)[1].is_nan());
    // not folded back onto latitude 80
    assert!(mercator.lat_lon_to_meters(80.0, 0.0)[1].is_finite());
    assert!(mercator.lat_lon_to_meters(f64::NAN, 0.0)[1].is_nan());
}

#[test]
fn test_checked_projection() {
    let mercator = GlobalMercator::default();
    assert_eq!(
        mercator.try_lat_lon_to_meters(90.0, 0.0),
        Err(MercatorError::LatitudeOutOfDomain { lat: 90.0 })
    );
    assert!(mercator.try_lat_lon_to_meters(f64::NAN, 0.0).is_err());
    assert_eq!(
        mercator.try_lat_lon_to_meters(45.0, 10.0),
        Ok(mercator.lat_lon_to_meters(45.0, 10.0))
    );
}

#[test]
fn test_pixels_and_meters() {
    let mercator = GlobalMercator::default();
    let shift = mercator.origin_shift();
    assert_eq!(mercator.pixels_to_meters(0.0, 0.0, 0), [-shift, -shift]);
    assert_relative_eq!(mercator.pixels_to_meters(256.0, 256.0, 0)[0], shift);
    assert_eq!(mercator.meters_to_pixels(-shift, -shift, 5), [0.0, 0.0]);
    assert_relative_eq!(mercator.meters_to_pixels(0.0, 0.0, 1)[0], 256.0);
    assert_eq!(mercator.pixels_to_raster(10.0, 0.0, 1), [10.0, 512.0]);
    assert_relative_eq!(mercator.lat_lon_to_pixels(0.0, 0.0, 2)[1], 512.0);
}

#[test]
fn test_meters_to_tile() {
    let mercator = GlobalMercator::default();
    let [mx, my] = mercator.lat_lon_to_meters(35.681236, 139.767125);
    let (tx, ty) = mercator.meters_to_tile(mx, my, 10);
    assert_eq!((tx, ty), (909, 620));
    assert_eq!(tile_index_scheme_convert(tx, ty, 10), (909, 403));
    let bounds = mercator.tile_bounds(tx, ty, 10, TileScheme::Tms);
    assert!(bounds.contains([mx, my]));
}

#[test]
fn test_tile_bounds_schemes() {
    let mercator = GlobalMercator::default();
    let shift = mercator.origin_shift();
    // top-left tile at zoom 1
    let tms = mercator.tile_bounds(0, 1, 1, TileScheme::Tms);
    let xyz = mercator.tile_bounds(0, 0, 1, TileScheme::Xyz);
    assert_eq!(tms, xyz);
    assert_eq!(tms.min, [-shift, 0.0]);
    assert_relative_eq!(tms.max[0], 0.0, epsilon = 1e-6);
    assert_relative_eq!(tms.max[1], shift);
}

#[test]
fn test_tile_lat_lon_bounds() {
    let mercator = GlobalMercator::default();
    let bounds = mercator.tile_lat_lon_bounds(0, 0, 0, TileScheme::Tms);
    assert_relative_eq!(bounds.min[0], -MAX_LATITUDE, max_relative = 1e-9);
    assert_relative_eq!(bounds.min[1], -180.0);
    assert_relative_eq!(bounds.max[0], MAX_LATITUDE, max_relative = 1e-9);
    assert_relative_eq!(bounds.max[1], 180.0);
}

#[test]
fn test_zoom_for_pixel_size() {
    let mercator = GlobalMercator::default();
    assert_eq!(mercator.zoom_for_pixel_size(1e6), Ok(0));
    assert_eq!(mercator.zoom_for_pixel_size(mercator.resolution(0)), Ok(0));
    // exactly the resolution of zoom 10 is not finer than it
    assert_eq!(mercator.zoom_for_pixel_size(mercator.resolution(10)), Ok(10));
    assert_eq!(mercator.zoom_for_pixel_size(mercator.resolution(10) * 1.5), Ok(9));
    assert_eq!(
        mercator.zoom_for_pixel_size(1e-6),
        Err(MercatorError::PixelSizeTooSmall { pixel_size: 1e-6 })
    );
}

#[test]
fn test_quad_key_children() {
    let parent = Tile::new(0, 0, 1);
    assert_eq!(parent.quad_key(TileScheme::Xyz), "0");
    let keys: Vec<String> = parent
        .children()
        .iter()
        .map(|t| t.quad_key(TileScheme::Xyz))
        .collect();
    assert_eq!(keys, ["00", "01", "02", "03"]);

    // the same quadrant addressed with TMS rows
    let parent = parent.flip();
    assert_eq!(parent.quad_key(TileScheme::Tms), "0");
    let mut keys: Vec<String> = parent
        .children()
        .iter()
        .map(|t| t.quad_key(TileScheme::Tms))
        .collect();
    keys.sort();
    assert_eq!(keys, ["00", "01", "02", "03"]);
}

#[test]
fn test_quad_key_known_tile() {
    // Bing maps documentation example: tile (3, 5) at level 3
    assert_eq!(quad_key(3, 5, 3, TileScheme::Xyz), "213");
    assert_eq!(quad_key_to_tile("213", TileScheme::Xyz), Ok((3, 5, 3)));
    assert_eq!(quad_key_to_tile("213", TileScheme::Tms), Ok((3, 2, 3)));
    assert_eq!(quad_key(0, 0, 0, TileScheme::Tms), "");
}

#[test]
fn test_custom_grid() {
    let mercator = GlobalMercator::new(512);
    assert_eq!(mercator.tile_size(), 512);
    assert_eq!(
        mercator.resolution(0),
        GlobalMercator::default().resolution(1)
    );
    let unit = GlobalMercator::default().with_earth_radius(1.0);
    assert_relative_eq!(unit.origin_shift(), std::f64::consts::PI);
}

#[cfg(feature = "serde")]
#[test]
fn test_config_from_json() {
    let mercator: GlobalMercator =
        serde_json::from_str(r#"{"tile_size": 512, "earth_radius": 6378137.0}"#).unwrap();
    assert_eq!(mercator, GlobalMercator::new(512));
    let scheme: TileScheme = serde_json::from_str(r#""Xyz""#).unwrap();
    assert_eq!(scheme, TileScheme::Xyz);
}

proptest! {
    #[test]
    fn prop_lat_lon_round_trip(lat in -85.0f64..85.0, lon in -180.0f64..180.0) {
        let mercator = GlobalMercator::default();
        let [x, y] = mercator.lat_lon_to_meters(lat, lon);
        let [lat2, lon2] = mercator.meters_to_lat_lon(x, y);
        prop_assert!((lat - lat2).abs() < 1e-6);
        prop_assert!((lon - lon2).abs() < 1e-6);
    }

    #[test]
    fn prop_resolution_halves(zoom in 0u8..MAX_ZOOM_LEVEL) {
        let mercator = GlobalMercator::default();
        prop_assert_eq!(mercator.resolution(zoom + 1), mercator.resolution(zoom) / 2.0);
    }

    #[test]
    fn prop_zoom_search_monotonic(a in 1e-3f64..1e6, b in 1e-3f64..1e6) {
        let mercator = GlobalMercator::default();
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        let z_small = mercator.zoom_for_pixel_size(small).unwrap();
        let z_large = mercator.zoom_for_pixel_size(large).unwrap();
        prop_assert!(z_small >= z_large);
        // never scales up past the requested pixel size
        prop_assert!(z_small == 0 || mercator.resolution(z_small) >= small);
    }

    #[test]
    fn prop_tile_bounds_size(zoom in 0u8..24, x in 0i64..1 << 20, y in 0i64..1 << 20) {
        let mercator = GlobalMercator::default();
        let n = 1i64 << zoom;
        let (x, y) = (x % n, y % n);
        let size = mercator.tile_size() as f64 * mercator.resolution(zoom);
        for scheme in [TileScheme::Tms, TileScheme::Xyz] {
            let bounds = mercator.tile_bounds(x, y, zoom, scheme);
            prop_assert!((bounds.width() - size).abs() <= size * 1e-6);
            prop_assert!((bounds.height() - size).abs() <= size * 1e-6);
            prop_assert!(bounds.min[0] <= bounds.max[0] && bounds.min[1] <= bounds.max[1]);
        }
    }

    #[test]
    fn prop_scheme_flip_involution(zoom in 0u8..=30, x in 0i64..1 << 30, y in 0i64..1 << 30) {
        let n = 1i64 << zoom;
        let (x, y) = (x % n, y % n);
        let (fx, fy) = tile_index_scheme_convert(x, y, zoom);
        prop_assert!((0..n).contains(&fy));
        prop_assert_eq!(tile_index_scheme_convert(fx, fy, zoom), (x, y));
    }

    #[test]
    fn prop_quad_key_round_trip(zoom in 0u8..=30, x in 0i64..1 << 30, y in 0i64..1 << 30) {
        let n = 1i64 << zoom;
        let (x, y) = (x % n, y % n);
        for scheme in [TileScheme::Tms, TileScheme::Xyz] {
            let key = quad_key(x, y, zoom, scheme);
            prop_assert_eq!(key.len(), zoom as usize);
            // decoding recovers the tile, so distinct tiles get distinct keys
            prop_assert_eq!(quad_key_to_tile(&key, scheme), Ok((x, y, zoom)));
        }
    }
}
