//! Projects a small park polygon (with a pond) onto the zoom 16 tile that
//! contains it and triangulates it in tile-local meters.

use tilecut::{deviation, flatten, Earcut, GlobalMercator, Tile, TileScheme};

fn main() {
    let mercator = GlobalMercator::default();
    let zoom = 16;

    // [lat, lon]
    let park = vec![
        [35.6840, 139.7600],
        [35.6840, 139.7640],
        [35.6865, 139.7640],
        [35.6870, 139.7620],
        [35.6865, 139.7600],
    ];
    let pond = vec![
        [35.6850, 139.7610],
        [35.6858, 139.7612],
        [35.6857, 139.7625],
        [35.6849, 139.7622],
    ];

    let [mx, my] = mercator.lat_lon_to_meters(park[0][0], park[0][1]);
    let (tx, ty) = mercator.meters_to_tile(mx, my, zoom);
    let tile = Tile::new(tx, ty, zoom).flip();
    let bounds = mercator.tile_bounds(tile.x, tile.y, zoom, TileScheme::Xyz);
    println!(
        "tile {}/{}/{} quad key {}",
        tile.zoom,
        tile.x,
        tile.y,
        tile.quad_key(TileScheme::Xyz)
    );

    let rings: Vec<Vec<[f64; 2]>> = [park, pond]
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|&[lat, lon]| {
                    let [x, y] = mercator.lat_lon_to_meters(lat, lon);
                    [x - bounds.min[0], y - bounds.min[1]]
                })
                .collect()
        })
        .collect();
    let flat = flatten(&rings);

    let mut earcut = Earcut::new();
    let mut triangles: Vec<u32> = Vec::new();
    let hole_indices: Vec<u32> = flat.hole_indices.iter().map(|&i| i as u32).collect();
    if let Err(err) = earcut.earcut(&flat.vertices, &hole_indices, flat.dim, &mut triangles) {
        eprintln!("triangulation failed: {err}");
        return;
    }

    for t in triangles.chunks_exact(3) {
        println!("{t:?}");
    }
    println!(
        "{} triangles, deviation {:e}",
        triangles.len() / 3,
        deviation(&flat.vertices, &hole_indices, flat.dim, &triangles)
    );
}
