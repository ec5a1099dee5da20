use std::fs;

use tilecut::{deviation, flatten, Earcut};

type Coords = Vec<Vec<[f64; 2]>>;

fn load_fixture(name: &str) -> (Vec<f64>, Vec<usize>) {
    let s = fs::read_to_string(format!("./tests/fixtures/{name}.json")).unwrap();
    let rings = serde_json::from_str::<Coords>(&s).unwrap();
    let flat = flatten(&rings);
    assert_eq!(flat.dim, 2);
    assert_eq!(flat.hole_indices.len(), rings.len() - 1);
    (flat.vertices, flat.hole_indices)
}

fn test_fixture(name: &str, num_triangles: usize, expected_deviation: f64) {
    let (data, hole_indices) = load_fixture(name);

    let mut triangles = vec![];
    let mut earcut = Earcut::new();
    earcut
        .earcut(&data, &hole_indices, 2, &mut triangles)
        .unwrap();

    assert_eq!(triangles.len(), num_triangles * 3);
    let num_points = data.len() / 2;
    assert!(triangles.iter().all(|&i| i < num_points));
    if !triangles.is_empty() {
        assert!(deviation(&data, &hole_indices, 2, &triangles) <= expected_deviation);
    }
}

#[test]
fn fixture_building() {
    test_fixture("building", 10, 0.0);
}

#[test]
fn fixture_building_closed() {
    test_fixture("building-closed", 10, 0.0);
}

#[test]
fn fixture_courtyards() {
    test_fixture("courtyards", 16, 0.0);
}

#[test]
fn fixture_degenerate() {
    test_fixture("degenerate", 0, 0.0);
}

#[test]
fn fixture_tile_square() {
    test_fixture("tile-square", 8, 0.0);
}

#[test]
fn fixture_hourglass() {
    // only a split along a diagonal finds ears here
    test_fixture("hourglass", 2, 0.0);
}

#[test]
fn fixture_shared_points() {
    test_fixture("shared-points", 4, 0.0);
}

#[test]
fn fixture_pinched() {
    // the ring crosses itself next to the pinch at (5, 3)
    test_fixture("pinched", 3, 0.011);
}

#[test]
fn fixture_split_output() {
    let (data, hole_indices) = load_fixture("shared-points");
    let mut triangles: Vec<usize> = vec![];
    Earcut::new()
        .earcut(&data, &hole_indices, 2, &mut triangles)
        .unwrap();
    assert_eq!(triangles, vec![7, 0, 1, 3, 4, 5, 3, 5, 2, 7, 1, 6]);
}

#[test]
fn fixture_u32_indices() {
    let (data, hole_indices) = load_fixture("courtyards");
    let hole_indices: Vec<u32> = hole_indices.iter().map(|&i| i as u32).collect();
    let mut triangles: Vec<u32> = vec![];
    Earcut::new()
        .earcut(&data, &hole_indices, 2, &mut triangles)
        .unwrap();
    assert_eq!(triangles.len(), 16 * 3);
    assert_eq!(deviation(&data, &hole_indices, 2, &triangles), 0.0);
}
