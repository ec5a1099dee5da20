//! Ear-clipping polygon triangulation with hole support.
//!
//! Input is a flat vertex buffer (`dim` coordinates per point, only the first
//! two are read), plus the point index at which each hole ring starts. Output
//! is a list of point indices, three per triangle, in the same index space as
//! the input buffer.
//!
//! The triangulator is best-effort: degenerate or self-intersecting rings are
//! never reported as errors. Such input yields a partial (possibly empty)
//! triangle list, so "fewer triangles than expected" is a property of the
//! input geometry rather than a failure. Use [`deviation`] to measure how much
//! of the polygon area a triangulation covers.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::iter;

use log::{debug, trace};
use num_traits::float::Float;

use crate::error::TriangulateError;

/// Point count above which ear tests are accelerated with a z-order index.
const HASH_THRESHOLD: usize = 80;

/// Largest per-axis value on the z-order grid (15 bits).
const Z_GRID_MAX: u32 = 32767;

/// Index of a vertex
pub trait Index: Copy {
    fn into_usize(self) -> usize;
    fn from_usize(v: usize) -> Self;
}

macro_rules! impl_index {
    ($($t:ty),*) => {
        $(
            impl Index for $t {
                #[inline]
                fn into_usize(self) -> usize {
                    self as usize
                }
                #[inline]
                fn from_usize(v: usize) -> Self {
                    v as Self
                }
            }
        )*
    };
}

impl_index!(u16, u32, usize);

macro_rules! node {
    ($nodes:expr, $index:expr) => {
        &$nodes[$index as usize]
    };
}

macro_rules! node_mut {
    ($nodes:expr, $index:expr) => {
        &mut $nodes[$index as usize]
    };
}

/// Position of a node in the arena.
type NodeIndex = u32;

struct Node<T: Float> {
    /// point index in the input buffer
    i: u32,
    /// z-order curve value
    z: i32,
    x: T,
    y: T,
    /// previous node in the ring
    prev_i: NodeIndex,
    /// next node in the ring
    next_i: NodeIndex,
    /// previous node in z-order
    prev_z_i: Option<NodeIndex>,
    /// next node in z-order
    next_z_i: Option<NodeIndex>,
    /// single-point hole that must survive point filtering
    steiner: bool,
}

impl<T: Float> Node<T> {
    /// A node linked only to itself.
    fn new(i: u32, x: T, y: T, self_i: NodeIndex) -> Self {
        Self {
            i,
            z: 0,
            x,
            y,
            prev_i: self_i,
            next_i: self_i,
            prev_z_i: None,
            next_z_i: None,
            steiner: false,
        }
    }
}

/// Maps coordinates onto the 15-bit grid spanned by the outer ring's bbox.
#[derive(Clone, Copy)]
struct ZOrder<T: Float> {
    min_x: T,
    min_y: T,
    inv_size: T,
}

impl<T: Float> ZOrder<T> {
    fn key(&self, x: T, y: T) -> i32 {
        let x = self.grid(x - self.min_x);
        let y = self.grid(y - self.min_y);
        let mut xy = (x as i64) << 32 | y as i64;
        xy = (xy | (xy << 8)) & 0x00FF00FF00FF00FF;
        xy = (xy | (xy << 4)) & 0x0F0F0F0F0F0F0F0F;
        xy = (xy | (xy << 2)) & 0x3333333333333333;
        xy = (xy | (xy << 1)) & 0x5555555555555555;
        (xy >> 32 | xy << 1) as i32
    }

    #[inline]
    fn grid(&self, offset: T) -> u32 {
        // points outside the outer ring's bbox saturate onto its edge
        (offset * self.inv_size)
            .to_u32()
            .unwrap_or(0)
            .min(Z_GRID_MAX)
    }
}

/// Instance of the earcut algorithm.
///
/// Working buffers are kept between calls, so reusing one instance for many
/// polygons avoids repeated allocation. Each call is independent of the
/// previous one.
pub struct Earcut<T: Float> {
    data: Vec<[T; 2]>,
    nodes: Vec<Node<T>>,
    queue: Vec<NodeIndex>,
}

impl<T: Float> Default for Earcut<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Earcut<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            nodes: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Triangulates a polygon given as a flat vertex buffer.
    ///
    /// `vertices` holds `dim` coordinates per point; `hole_indices` holds the
    /// point index where each hole ring starts (empty for no holes). Rings are
    /// implicitly closed. The triangles are written to `triangles_out`,
    /// replacing its previous contents.
    ///
    /// Only the shape of the input is validated. Degenerate geometry produces
    /// fewer (or zero) triangles, never an error.
    pub fn earcut<N: Index>(
        &mut self,
        vertices: &[T],
        hole_indices: &[N],
        dim: usize,
        triangles_out: &mut Vec<N>,
    ) -> Result<(), TriangulateError> {
        triangles_out.clear();
        validate_input(vertices.len(), hole_indices, dim)?;

        self.data.clear();
        self.data
            .extend(vertices.chunks_exact(dim).map(|v| [v[0], v[1]]));
        if self.data.len() < 3 {
            return Ok(());
        }
        self.triangulate_rings(hole_indices, triangles_out);
        Ok(())
    }

    fn triangulate_rings<N: Index>(&mut self, hole_indices: &[N], triangles_out: &mut Vec<N>) {
        triangles_out.reserve(self.data.len() + 1);
        self.nodes.clear();
        self.nodes.reserve(self.data.len() / 2 * 3);

        let outer_len = hole_indices
            .first()
            .map_or(self.data.len(), |i| i.into_usize());

        let Some(mut outer_i) = self.linked_list(0, outer_len, true) else {
            return;
        };
        let outer = node!(self.nodes, outer_i);
        if outer.next_i == outer.prev_i {
            return;
        }
        if !hole_indices.is_empty() {
            outer_i = self.eliminate_holes(hole_indices, outer_i);
        }

        let z_order = self.z_order(outer_len);
        if let Some(z) = &z_order {
            trace!(
                "indexing {} points on a z-order grid (origin {:?}, scale {:?})",
                self.data.len(),
                (z.min_x.to_f64(), z.min_y.to_f64()),
                z.inv_size.to_f64()
            );
        }

        earcut_linked(&mut self.nodes, outer_i, triangles_out, z_order, Pass::P0);
    }

    /// z-order grid over the outer ring's bbox, if the polygon is large enough to benefit.
    fn z_order(&self, outer_len: usize) -> Option<ZOrder<T>> {
        if self.data.len() <= HASH_THRESHOLD {
            return None;
        }
        let [first, rest @ ..] = &self.data[..outer_len] else {
            return None;
        };
        let ([min_x, min_y], [max_x, max_y]) =
            rest.iter()
                .fold((*first, *first), |([x0, y0], [x1, y1]), &[x, y]| {
                    ([x0.min(x), y0.min(y)], [x1.max(x), y1.max(y)])
                });
        let size = (max_x - min_x).max(max_y - min_y);
        if size == T::zero() {
            return None;
        }
        Some(ZOrder {
            min_x,
            min_y,
            inv_size: T::from(Z_GRID_MAX)? / size,
        })
    }

    /// create a circular doubly linked list from polygon points in the specified winding order
    fn linked_list(&mut self, start: usize, end: usize, clockwise: bool) -> Option<NodeIndex> {
        let mut last_i: Option<NodeIndex> = None;
        let ring = self.data[start..end]
            .iter()
            .enumerate()
            .map(|(k, &[x, y])| ((start + k) as u32, x, y));

        if clockwise == (signed_area(&self.data, start, end) > T::zero()) {
            for (i, x, y) in ring {
                last_i = Some(insert_node(&mut self.nodes, i, x, y, last_i));
            }
        } else {
            for (i, x, y) in ring.rev() {
                last_i = Some(insert_node(&mut self.nodes, i, x, y, last_i));
            }
        }

        // a repeated closing vertex is dropped
        let last_i = last_i?;
        let last = node!(self.nodes, last_i);
        if equals(last, node!(self.nodes, last.next_i)) {
            let (_, next_i) = remove_node(&mut self.nodes, last_i);
            return Some(next_i);
        }
        Some(last_i)
    }

    /// link every hole into the outer loop, producing a single-ring polygon without holes
    fn eliminate_holes<N: Index>(&mut self, hole_indices: &[N], mut outer_i: NodeIndex) -> NodeIndex {
        self.queue.clear();
        let starts = hole_indices.iter().map(|i| i.into_usize());
        let ends = starts.clone().skip(1).chain(iter::once(self.data.len()));
        for (start, end) in starts.zip(ends) {
            if let Some(list_i) = self.linked_list(start, end, false) {
                let list = node_mut!(self.nodes, list_i);
                if list.next_i == list_i {
                    list.steiner = true;
                }
                self.queue.push(leftmost(&self.nodes, list_i));
            }
        }

        let nodes = &self.nodes;
        self.queue.sort_unstable_by(|&a, &b| {
            let (a, b) = (node!(nodes, a), node!(nodes, b));
            a.x.partial_cmp(&b.x)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
        });

        // process holes from left to right
        for &hole_i in &self.queue {
            outer_i = eliminate_hole(&mut self.nodes, hole_i, outer_i);
        }
        outer_i
    }
}

/// Triangulates a polygon and returns the triangle indices.
///
/// Convenience wrapper around [`Earcut::earcut`] for one-off calls.
///
/// ```
/// let square = [0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];
/// let triangles = tilecut::triangulate(&square, &[], 2).unwrap();
/// assert_eq!(triangles.len(), 6);
/// ```
pub fn triangulate<T: Float>(
    vertices: &[T],
    hole_starts: &[usize],
    dim: usize,
) -> Result<Vec<usize>, TriangulateError> {
    let mut triangles = Vec::new();
    Earcut::new().earcut(vertices, hole_starts, dim, &mut triangles)?;
    Ok(triangles)
}

fn validate_input<N: Index>(
    len: usize,
    hole_indices: &[N],
    dim: usize,
) -> Result<(), TriangulateError> {
    if dim < 2 {
        return Err(TriangulateError::InvalidDimension { dim });
    }
    if len % dim != 0 {
        return Err(TriangulateError::RaggedVertices { len, dim });
    }
    let num_points = len / dim;
    let mut prev = 0;
    for index in hole_indices.iter().map(|i| i.into_usize()) {
        if index > num_points {
            return Err(TriangulateError::HoleIndexOutOfRange { index, num_points });
        }
        if index < prev {
            return Err(TriangulateError::UnsortedHoleIndices);
        }
        prev = index;
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pass {
    /// plain ear slicing
    P0,
    /// ear slicing after filtering degenerate points
    P1,
    /// ear slicing after curing local self-intersections
    P2,
}

/// main ear slicing loop which triangulates a polygon (given as a linked list)
fn earcut_linked<T: Float, N: Index>(
    nodes: &mut Vec<Node<T>>,
    mut ear_i: NodeIndex,
    triangles: &mut Vec<N>,
    z_order: Option<ZOrder<T>>,
    pass: Pass,
) {
    // interlink polygon nodes in z-order
    if pass == Pass::P0 {
        if let Some(z) = &z_order {
            index_curve(nodes, ear_i, z);
        }
    }

    let mut stop_i = ear_i;

    // iterate through ears, slicing them one by one
    loop {
        let ear = node!(nodes, ear_i);
        if ear.prev_i == ear.next_i {
            break;
        }
        let (prev_i, next_i) = (ear.prev_i, ear.next_i);

        let is_ear = match &z_order {
            Some(z) => is_ear_hashed(nodes, ear_i, z),
            None => is_ear(nodes, ear_i),
        };
        if is_ear {
            let next = node!(nodes, next_i);
            let next_next_i = next.next_i;

            // cut off the triangle
            triangles.extend(
                [node!(nodes, prev_i).i, ear.i, next.i].map(|i| N::from_usize(i as usize)),
            );
            remove_node(nodes, ear_i);

            // skipping the next vertex leads to less sliver triangles
            (ear_i, stop_i) = (next_next_i, next_next_i);
            continue;
        }

        ear_i = next_i;

        // if we looped through the whole remaining polygon and can't find any more ears
        if ear_i == stop_i {
            match pass {
                Pass::P0 => {
                    trace!("no ears left, filtering points and retrying");
                    let ear_i = filter_points(nodes, ear_i, None);
                    earcut_linked(nodes, ear_i, triangles, z_order, Pass::P1);
                }
                Pass::P1 => {
                    debug!("curing local self-intersections at vertex {}", node!(nodes, ear_i).i);
                    let filtered = filter_points(nodes, ear_i, None);
                    let ear_i = cure_local_intersections(nodes, filtered, triangles);
                    earcut_linked(nodes, ear_i, triangles, z_order, Pass::P2);
                }
                Pass::P2 => {
                    debug!("splitting remaining polygon at vertex {}", node!(nodes, ear_i).i);
                    split_earcut(nodes, ear_i, triangles, z_order);
                }
            }
            return;
        }
    }
}

/// A candidate ear `(a, b, c)` with `b` the tip, and the bbox of the triangle.
struct Ear<'a, T: Float> {
    a_i: NodeIndex,
    c_i: NodeIndex,
    a: &'a Node<T>,
    b: &'a Node<T>,
    c: &'a Node<T>,
    min: [T; 2],
    max: [T; 2],
}

impl<'a, T: Float> Ear<'a, T> {
    fn new(nodes: &'a [Node<T>], ear_i: NodeIndex) -> Self {
        let b = node!(nodes, ear_i);
        let (a_i, c_i) = (b.prev_i, b.next_i);
        let a = node!(nodes, a_i);
        let c = node!(nodes, c_i);
        Self {
            a_i,
            c_i,
            a,
            b,
            c,
            min: [a.x.min(b.x.min(c.x)), a.y.min(b.y.min(c.y))],
            max: [a.x.max(b.x.max(c.x)), a.y.max(b.y.max(c.y))],
        }
    }

    fn is_reflex(&self) -> bool {
        area(self.a, self.b, self.c) >= T::zero()
    }

    /// whether `p` is a reflex vertex inside the ear, which rules the ear out
    fn is_blocked_by(&self, nodes: &[Node<T>], p: &Node<T>) -> bool {
        (p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1])
            && point_in_triangle(
                [self.a.x, self.a.y],
                [self.b.x, self.b.y],
                [self.c.x, self.c.y],
                [p.x, p.y],
            )
            && area(node!(nodes, p.prev_i), p, node!(nodes, p.next_i)) >= T::zero()
    }
}

/// check whether a polygon node forms a valid ear with adjacent nodes
fn is_ear<T: Float>(nodes: &[Node<T>], ear_i: NodeIndex) -> bool {
    let ear = Ear::new(nodes, ear_i);
    if ear.is_reflex() {
        return false;
    }

    // make sure we don't have other points inside the potential ear
    let mut p_i = ear.c.next_i;
    while p_i != ear.a_i {
        let p = node!(nodes, p_i);
        if ear.is_blocked_by(nodes, p) {
            return false;
        }
        p_i = p.next_i;
    }
    true
}

fn is_ear_hashed<T: Float>(nodes: &[Node<T>], ear_i: NodeIndex, z_order: &ZOrder<T>) -> bool {
    let ear = Ear::new(nodes, ear_i);
    if ear.is_reflex() {
        return false;
    }

    // z-order range for the current triangle bbox
    let min_z = z_order.key(ear.min[0], ear.min[1]);
    let max_z = z_order.key(ear.max[0], ear.max[1]);

    let blocks = |i: NodeIndex| i != ear.a_i && i != ear.c_i && ear.is_blocked_by(nodes, node!(nodes, i));

    let mut o_p = ear.b.prev_z_i;
    let mut o_n = ear.b.next_z_i;

    // look for points inside the triangle in both directions
    while let (Some(p_i), Some(n_i)) = (o_p, o_n) {
        let (p, n) = (node!(nodes, p_i), node!(nodes, n_i));
        if p.z < min_z || n.z > max_z {
            break;
        }
        if blocks(p_i) {
            return false;
        }
        o_p = p.prev_z_i;
        if blocks(n_i) {
            return false;
        }
        o_n = n.next_z_i;
    }

    // look for remaining points in decreasing z-order
    while let Some(p_i) = o_p {
        let p = node!(nodes, p_i);
        if p.z < min_z {
            break;
        }
        if blocks(p_i) {
            return false;
        }
        o_p = p.prev_z_i;
    }

    // look for remaining points in increasing z-order
    while let Some(n_i) = o_n {
        let n = node!(nodes, n_i);
        if n.z > max_z {
            break;
        }
        if blocks(n_i) {
            return false;
        }
        o_n = n.next_z_i;
    }

    true
}

/// go through all polygon nodes and cure small local self-intersections
fn cure_local_intersections<T: Float, N: Index>(
    nodes: &mut [Node<T>],
    mut start_i: NodeIndex,
    triangles: &mut Vec<N>,
) -> NodeIndex {
    let mut p_i = start_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next_i = p.next_i;
        let p_next = node!(nodes, p_next_i);
        let b_i = p_next.next_i;
        let a = node!(nodes, p.prev_i);
        let b = node!(nodes, b_i);

        if !equals(a, b)
            && intersects(a, p, p_next, b)
            && locally_inside(nodes, a, b)
            && locally_inside(nodes, b, a)
        {
            triangles.extend([a.i, p.i, b.i].map(|i| N::from_usize(i as usize)));

            // remove two nodes involved
            remove_node(nodes, p_i);
            remove_node(nodes, p_next_i);

            (p_i, start_i) = (b_i, b_i);
        }

        p_i = node!(nodes, p_i).next_i;
        if p_i == start_i {
            return filter_points(nodes, p_i, None);
        }
    }
}

/// try splitting polygon into two and triangulate them independently
fn split_earcut<T: Float, N: Index>(
    nodes: &mut Vec<Node<T>>,
    start_i: NodeIndex,
    triangles: &mut Vec<N>,
    z_order: Option<ZOrder<T>>,
) {
    // look for a valid diagonal that divides the polygon into two
    let mut a_i = start_i;
    loop {
        let a = node!(nodes, a_i);
        let (a_prev_i, a_next_i, a_vertex) = (a.prev_i, a.next_i, a.i);
        let mut b_i = node!(nodes, a_next_i).next_i;

        while b_i != a_prev_i {
            if a_vertex != node!(nodes, b_i).i && is_valid_diagonal(nodes, a_i, b_i) {
                // split the polygon in two by the diagonal
                let c_i = split_polygon(nodes, a_i, b_i);

                // filter colinear points around the cuts
                let end_i = node!(nodes, a_i).next_i;
                let a_i = filter_points(nodes, a_i, Some(end_i));
                let end_i = node!(nodes, c_i).next_i;
                let c_i = filter_points(nodes, c_i, Some(end_i));

                // run earcut on each half
                earcut_linked(nodes, a_i, triangles, z_order, Pass::P0);
                earcut_linked(nodes, c_i, triangles, z_order, Pass::P0);
                return;
            }
            b_i = node!(nodes, b_i).next_i;
        }

        a_i = a_next_i;
        if a_i == start_i {
            return;
        }
    }
}

/// interlink polygon nodes in z-order
fn index_curve<T: Float>(nodes: &mut [Node<T>], start_i: NodeIndex, z_order: &ZOrder<T>) {
    let mut p_i = start_i;
    loop {
        let p = node_mut!(nodes, p_i);
        if p.z == 0 {
            p.z = z_order.key(p.x, p.y);
        }
        p.prev_z_i = Some(p.prev_i);
        p.next_z_i = Some(p.next_i);
        p_i = p.next_i;
        if p_i == start_i {
            break;
        }
    }

    // open the ring so it can be sorted as a plain list
    if let Some(tail_i) = node_mut!(nodes, start_i).prev_z_i.take() {
        node_mut!(nodes, tail_i).next_z_i = None;
    }
    sort_linked(nodes, start_i);
}

/// Simon Tatham's linked list merge sort algorithm
/// http://www.chiark.greenend.org.uk/~sgtatham/algorithms/listsort.html
fn sort_linked<T: Float>(nodes: &mut [Node<T>], list_i: NodeIndex) {
    let mut list = Some(list_i);
    let mut in_size: usize = 1;

    loop {
        let mut p = list;
        list = None;
        let mut tail: Option<NodeIndex> = None;
        let mut num_merges = 0;

        while let Some(p_start) = p {
            num_merges += 1;

            // step `in_size` places along from p to find q
            let mut q = Some(p_start);
            let mut p_size: usize = 0;
            for _ in 0..in_size {
                let Some(q_i) = q else { break };
                p_size += 1;
                q = node!(nodes, q_i).next_z_i;
            }
            let mut q_size = in_size;

            // merge the two runs
            loop {
                let from_p = match (p.filter(|_| p_size > 0), q.filter(|_| q_size > 0)) {
                    (Some(p_i), Some(q_i)) => node!(nodes, p_i).z <= node!(nodes, q_i).z,
                    (Some(_), None) => true,
                    (None, Some(_)) => false,
                    (None, None) => break,
                };
                let (cursor, size) = if from_p {
                    (&mut p, &mut p_size)
                } else {
                    (&mut q, &mut q_size)
                };
                let Some(e_i) = *cursor else { break };
                *size -= 1;
                *cursor = node!(nodes, e_i).next_z_i;

                node_mut!(nodes, e_i).prev_z_i = tail;
                match tail {
                    Some(tail_i) => node_mut!(nodes, tail_i).next_z_i = Some(e_i),
                    None => list = Some(e_i),
                }
                tail = Some(e_i);
            }

            p = q;
        }

        if let Some(tail_i) = tail {
            node_mut!(nodes, tail_i).next_z_i = None;
        }
        if num_merges <= 1 {
            break;
        }
        in_size *= 2;
    }
}

/// find the leftmost node of a polygon ring
fn leftmost<T: Float>(nodes: &[Node<T>], start_i: NodeIndex) -> NodeIndex {
    let mut p_i = start_i;
    let mut leftmost_i = start_i;
    loop {
        let p = node!(nodes, p_i);
        let l = node!(nodes, leftmost_i);
        if p.x < l.x || (p.x == l.x && p.y < l.y) {
            leftmost_i = p_i;
        }
        p_i = p.next_i;
        if p_i == start_i {
            return leftmost_i;
        }
    }
}

/// check if a diagonal between two polygon nodes is valid (lies in polygon interior)
fn is_valid_diagonal<T: Float>(nodes: &[Node<T>], a_i: NodeIndex, b_i: NodeIndex) -> bool {
    let (a, b) = (node!(nodes, a_i), node!(nodes, b_i));
    let (a_prev, a_next) = (node!(nodes, a.prev_i), node!(nodes, a.next_i));
    let (b_prev, b_next) = (node!(nodes, b.prev_i), node!(nodes, b.next_i));

    // doesn't intersect other edges
    (a_next.i != b.i && a_prev.i != b.i && !intersects_polygon(nodes, a_i, a, b))
        // locally visible
        && ((locally_inside(nodes, a, b) && locally_inside(nodes, b, a) && middle_inside(nodes, a_i, a, b))
            // does not create opposite-facing sectors
            && (area(a_prev, a, b_prev) != T::zero() || area(a, b_prev, b) != T::zero())
            // special zero-length case
            || equals(a, b)
                && area(a_prev, a, a_next) > T::zero()
                && area(b_prev, b, b_next) > T::zero())
}

/// check if two segments intersect
fn intersects<T: Float>(p1: &Node<T>, q1: &Node<T>, p2: &Node<T>, q2: &Node<T>) -> bool {
    let o1 = sign(area(p1, q1, p2));
    let o2 = sign(area(p1, q1, q2));
    let o3 = sign(area(p2, q2, p1));
    let o4 = sign(area(p2, q2, q1));
    (o1 != o2 && o3 != o4) // general case
        || (o3 == 0 && on_segment(p2, p1, q2)) // p2, q2 and p1 are collinear and p1 lies on p2q2
        || (o4 == 0 && on_segment(p2, q1, q2)) // p2, q2 and q1 are collinear and q1 lies on p2q2
        || (o2 == 0 && on_segment(p1, q2, q1)) // p1, q1 and q2 are collinear and q2 lies on p1q1
        || (o1 == 0 && on_segment(p1, p2, q1)) // p1, q1 and p2 are collinear and p2 lies on p1q1
}

/// check if a polygon diagonal intersects any polygon segments
fn intersects_polygon<T: Float>(nodes: &[Node<T>], a_i: NodeIndex, a: &Node<T>, b: &Node<T>) -> bool {
    let mut p_i = a_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next = node!(nodes, p.next_i);
        if (p.i != a.i && p.i != b.i && p_next.i != a.i && p_next.i != b.i)
            && intersects(p, p_next, a, b)
        {
            return true;
        }
        p_i = p.next_i;
        if p_i == a_i {
            return false;
        }
    }
}

/// check if the middle point of a polygon diagonal is inside the polygon
fn middle_inside<T: Float>(nodes: &[Node<T>], a_i: NodeIndex, a: &Node<T>, b: &Node<T>) -> bool {
    let two = T::one() + T::one();
    let (px, py) = ((a.x + b.x) / two, (a.y + b.y) / two);
    let mut inside = false;
    let mut p_i = a_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next = node!(nodes, p.next_i);
        inside ^= (p.y > py) != (p_next.y > py)
            && p_next.y != p.y
            && (px < (p_next.x - p.x) * (py - p.y) / (p_next.y - p.y) + p.x);
        p_i = p.next_i;
        if p_i == a_i {
            return inside;
        }
    }
}

/// find a bridge between vertices that connects hole with an outer ring and link it
fn eliminate_hole<T: Float>(
    nodes: &mut Vec<Node<T>>,
    hole_i: NodeIndex,
    outer_i: NodeIndex,
) -> NodeIndex {
    let Some(bridge_i) = find_hole_bridge(nodes, hole_i, outer_i) else {
        debug!(
            "no bridge found for hole at vertex {}, leaving it unexcised",
            node!(nodes, hole_i).i
        );
        return outer_i;
    };
    let bridge_reverse_i = split_polygon(nodes, bridge_i, hole_i);

    // filter collinear points around the cuts
    let end_i = node!(nodes, bridge_reverse_i).next_i;
    filter_points(nodes, bridge_reverse_i, Some(end_i));
    let end_i = node!(nodes, bridge_i).next_i;
    filter_points(nodes, bridge_i, Some(end_i))
}

/// check if a polygon diagonal is locally inside the polygon
fn locally_inside<T: Float>(nodes: &[Node<T>], a: &Node<T>, b: &Node<T>) -> bool {
    let a_prev = node!(nodes, a.prev_i);
    let a_next = node!(nodes, a.next_i);
    if area(a_prev, a, a_next) < T::zero() {
        area(a, b, a_next) >= T::zero() && area(a, a_prev, b) >= T::zero()
    } else {
        area(a, b, a_prev) < T::zero() || area(a, a_next, b) < T::zero()
    }
}

/// David Eberly's algorithm for finding a bridge between hole and outer polygon
fn find_hole_bridge<T: Float>(
    nodes: &[Node<T>],
    hole_i: NodeIndex,
    outer_i: NodeIndex,
) -> Option<NodeIndex> {
    let hole = node!(nodes, hole_i);
    let (hx, hy) = (hole.x, hole.y);
    let mut qx = T::neg_infinity();
    let mut m_i: Option<NodeIndex> = None;

    // find a segment intersected by a ray from the hole's leftmost point to the left;
    // segment's endpoint with lesser x will be potential connection point
    let mut p_i = outer_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next = node!(nodes, p.next_i);
        if hy <= p.y && hy >= p_next.y && p_next.y != p.y {
            let x = p.x + (hy - p.y) * (p_next.x - p.x) / (p_next.y - p.y);
            if x <= hx && x > qx {
                qx = x;
                let candidate = if p.x < p_next.x { p_i } else { p.next_i };
                if x == hx {
                    // hole touches outer segment; pick leftmost endpoint
                    return Some(candidate);
                }
                m_i = Some(candidate);
            }
        }
        p_i = p.next_i;
        if p_i == outer_i {
            break;
        }
    }

    let mut m_i = m_i?;

    // look for points inside the triangle of hole point, segment intersection and endpoint;
    // if there are no points found, we have a valid connection;
    // otherwise choose the point of the minimum angle with the ray as connection point
    let stop_i = m_i;
    let (mx, my) = (node!(nodes, m_i).x, node!(nodes, m_i).y);
    let (tri_a, tri_c) = if hy < my { ([hx, hy], [qx, hy]) } else { ([qx, hy], [hx, hy]) };
    let mut tan_min = T::infinity();

    p_i = m_i;
    loop {
        let p = node!(nodes, p_i);
        if (hx >= p.x && p.x >= mx && hx != p.x) && point_in_triangle(tri_a, [mx, my], tri_c, [p.x, p.y]) {
            let m = node!(nodes, m_i);
            let tan = (hy - p.y).abs() / (hx - p.x);
            if locally_inside(nodes, p, hole)
                && (tan < tan_min
                    || (tan == tan_min
                        && (p.x > m.x || (p.x == m.x && sector_contains_sector(nodes, m, p)))))
            {
                m_i = p_i;
                tan_min = tan;
            }
        }

        p_i = p.next_i;
        if p_i == stop_i {
            return Some(m_i);
        }
    }
}

/// whether sector in vertex m contains sector in vertex p in the same coordinates
fn sector_contains_sector<T: Float>(nodes: &[Node<T>], m: &Node<T>, p: &Node<T>) -> bool {
    area(node!(nodes, m.prev_i), m, node!(nodes, p.prev_i)) < T::zero()
        && area(node!(nodes, p.next_i), m, node!(nodes, m.next_i)) < T::zero()
}

/// eliminate colinear or duplicate points
fn filter_points<T: Float>(
    nodes: &mut [Node<T>],
    start_i: NodeIndex,
    end_i: Option<NodeIndex>,
) -> NodeIndex {
    let mut end_i = end_i.unwrap_or(start_i);

    let mut p_i = start_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next = node!(nodes, p.next_i);
        if !p.steiner && (equals(p, p_next) || area(node!(nodes, p.prev_i), p, p_next) == T::zero()) {
            let (prev_i, next_i) = remove_node(nodes, p_i);
            (p_i, end_i) = (prev_i, prev_i);
            if p_i == next_i {
                return end_i;
            }
        } else {
            p_i = p.next_i;
            if p_i == end_i {
                return end_i;
            }
        }
    }
}

/// link two polygon vertices with a bridge; if the vertices belong to the same ring, it splits polygon into two;
/// if one belongs to the outer ring and another to a hole, it merges it into a single ring
fn split_polygon<T: Float>(nodes: &mut Vec<Node<T>>, a_i: NodeIndex, b_i: NodeIndex) -> NodeIndex {
    let a2_i = nodes.len() as NodeIndex;
    let b2_i = a2_i + 1;

    let a = node_mut!(nodes, a_i);
    let an_i = a.next_i;
    a.next_i = b_i;
    let a2 = Node {
        prev_i: b2_i,
        next_i: an_i,
        ..Node::new(a.i, a.x, a.y, a2_i)
    };

    let b = node_mut!(nodes, b_i);
    let bp_i = b.prev_i;
    b.prev_i = a_i;
    let b2 = Node {
        prev_i: bp_i,
        next_i: a2_i,
        ..Node::new(b.i, b.x, b.y, b2_i)
    };

    node_mut!(nodes, an_i).prev_i = a2_i;
    node_mut!(nodes, bp_i).next_i = b2_i;
    nodes.extend([a2, b2]);

    b2_i
}

/// create a node and optionally link it with previous one (in a circular doubly linked list)
fn insert_node<T: Float>(
    nodes: &mut Vec<Node<T>>,
    i: u32,
    x: T,
    y: T,
    last: Option<NodeIndex>,
) -> NodeIndex {
    let p_i = nodes.len() as NodeIndex;
    let mut p = Node::new(i, x, y, p_i);
    if let Some(last_i) = last {
        let last = node_mut!(nodes, last_i);
        p.prev_i = last_i;
        p.next_i = last.next_i;
        last.next_i = p_i;
        node_mut!(nodes, p.next_i).prev_i = p_i;
    }
    nodes.push(p);
    p_i
}

/// unlink a node from both lists, returning its ring neighbours
fn remove_node<T: Float>(nodes: &mut [Node<T>], p_i: NodeIndex) -> (NodeIndex, NodeIndex) {
    let p = node!(nodes, p_i);
    let (prev_i, next_i) = (p.prev_i, p.next_i);
    let (prev_z_i, next_z_i) = (p.prev_z_i, p.next_z_i);

    node_mut!(nodes, next_i).prev_i = prev_i;
    node_mut!(nodes, prev_i).next_i = next_i;

    if let Some(prev_z_i) = prev_z_i {
        node_mut!(nodes, prev_z_i).next_z_i = next_z_i;
    }
    if let Some(next_z_i) = next_z_i {
        node_mut!(nodes, next_z_i).prev_z_i = prev_z_i;
    }
    (prev_i, next_i)
}

/// Returns a percentage difference between the polygon area and its triangulation area;
/// used to verify correctness of triangulation
///
/// # Panics
///
/// Panics if `dim` is zero or a triangle refers to a point outside `vertices`.
pub fn deviation<T: Float, N: Index>(
    vertices: &[T],
    hole_indices: &[N],
    dim: usize,
    triangles: &[N],
) -> T {
    let data: Vec<[T; 2]> = vertices.chunks_exact(dim).map(|v| [v[0], v[1]]).collect();
    let outer_len = hole_indices
        .first()
        .map_or(data.len(), |i| i.into_usize());

    let mut polygon_area = signed_area(&data, 0, outer_len).abs();
    let starts = hole_indices.iter().map(|i| i.into_usize());
    let ends = starts.clone().skip(1).chain(iter::once(data.len()));
    for (start, end) in starts.zip(ends) {
        if end >= start + 3 {
            polygon_area = polygon_area - signed_area(&data, start, end).abs();
        }
    }

    let triangles_area = triangles
        .chunks_exact(3)
        .map(|t| {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| data[i.into_usize()]);
            ((a[0] - c[0]) * (b[1] - a[1]) - (a[0] - b[0]) * (c[1] - a[1])).abs()
        })
        .fold(T::zero(), |sum, a| sum + a);

    if polygon_area == T::zero() && triangles_area == T::zero() {
        T::zero()
    } else {
        ((polygon_area - triangles_area) / polygon_area).abs()
    }
}

/// Nested rings flattened into the buffer layout [`Earcut::earcut`] expects.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened<T> {
    pub vertices: Vec<T>,
    pub hole_indices: Vec<usize>,
    pub dim: usize,
}

/// Flattens nested rings (outer ring first, then holes) into a flat vertex
/// buffer plus hole start indices.
///
/// ```
/// let rings = [
///     vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
///     vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]],
/// ];
/// let flat = tilecut::flatten(&rings);
/// assert_eq!(flat.hole_indices, [4]);
/// assert_eq!(flat.vertices.len(), 16);
/// ```
pub fn flatten<T: Copy, R: AsRef<[[T; D]]>, const D: usize>(rings: &[R]) -> Flattened<T> {
    let mut vertices = Vec::new();
    let mut hole_indices = Vec::with_capacity(rings.len().saturating_sub(1));
    let mut num_points = 0;
    for (k, ring) in rings.iter().enumerate() {
        let ring = ring.as_ref();
        if k > 0 {
            hole_indices.push(num_points);
        }
        vertices.extend(ring.iter().flatten().copied());
        num_points += ring.len();
    }
    Flattened {
        vertices,
        hole_indices,
        dim: D,
    }
}

/// twice the signed area of a ring (shoelace formula)
fn signed_area<T: Float>(data: &[[T; 2]], start: usize, end: usize) -> T {
    if start >= end {
        return T::zero();
    }
    let [mut bx, mut by] = data[end - 1];
    let mut sum = T::zero();
    for &[ax, ay] in &data[start..end] {
        sum = sum + (bx - ax) * (ay + by);
        (bx, by) = (ax, ay);
    }
    sum
}

/// check if a point lies within a convex triangle
fn point_in_triangle<T: Float>([ax, ay]: [T; 2], [bx, by]: [T; 2], [cx, cy]: [T; 2], [px, py]: [T; 2]) -> bool {
    (cx - px) * (ay - py) >= (ax - px) * (cy - py)
        && (ax - px) * (by - py) >= (bx - px) * (ay - py)
        && (bx - px) * (cy - py) >= (cx - px) * (by - py)
}

/// signed area of a triangle
fn area<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> T {
    (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y)
}

/// check if two points are equal
fn equals<T: Float>(p1: &Node<T>, p2: &Node<T>) -> bool {
    p1.x == p2.x && p1.y == p2.y
}

/// for collinear points p, q, r, check if point q lies on segment pr
fn on_segment<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

fn sign<T: Float>(v: T) -> i32 {
    (v > T::zero()) as i32 - (v < T::zero()) as i32
}
