//! Static 2D point index.
//!
//! A k-d tree packed into two flat arrays: point ids and interleaved `f32`
//! coordinate pairs. Points are added through an [`IndexBuilder`]; calling
//! [`IndexBuilder::finish`] partitions the arrays in place and yields an
//! immutable [`KdIndex`] answering box and radius queries.
//!
//! ## Layout
//!
//! Every subrange of the arrays longer than the node size is split at its
//! median along one axis (x at even depths, y at odd depths): all points left
//! of the median compare `<=` on that axis, all points right of it `>=`.
//! Subranges within the node size are left unordered and scanned linearly.
//!
//! ## Example
//!
//! ```rust
//! use geocluster::index::IndexBuilder;
//!
//! let mut builder = IndexBuilder::new(3);
//! builder.add(0.0, 0.0)?;
//! builder.add(1.0, 1.0)?;
//! builder.add(5.0, 5.0)?;
//! let index = builder.finish()?;
//!
//! let mut hits = index.range(-1.0, -1.0, 2.0, 2.0);
//! hits.sort_unstable();
//! assert_eq!(hits, vec![0, 1]);
//! assert_eq!(index.within(5.0, 5.0, 0.0), vec![2]);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

mod select;
mod serialize;

use crate::error::{ClusterError, Result};
use smallvec::SmallVec;

/// Default number of points below which a node is scanned linearly.
pub const DEFAULT_NODE_SIZE: usize = 64;

const MIN_NODE_SIZE: usize = 2;
const MAX_NODE_SIZE: usize = 65_535;
/// Ids are `u32`.
const MAX_ITEMS: usize = u32::MAX as usize;
/// Larger builders grow their arrays as points are added.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Pending subrange `[lo, hi)` and its split axis.
type Span = (usize, usize, usize);

/// Collects points for a [`KdIndex`].
///
/// The number of points is declared up front; `finish` fails unless exactly
/// that many were added.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    num_items: usize,
    node_size: usize,
    ids: Vec<u32>,
    coords: Vec<f32>,
}

impl IndexBuilder {
    /// Create a builder for `num_items` points with the default node size.
    pub fn new(num_items: usize) -> Self {
        Self::with_node_size(num_items, DEFAULT_NODE_SIZE)
    }

    /// Create a builder with an explicit node size, clamped to `[2, 65535]`.
    ///
    /// `num_items` is capped at `u32::MAX`.
    pub fn with_node_size(num_items: usize, node_size: usize) -> Self {
        let num_items = num_items.min(MAX_ITEMS);
        let reserved = num_items.min(MAX_PREALLOCATED);
        Self {
            num_items,
            node_size: node_size.clamp(MIN_NODE_SIZE, MAX_NODE_SIZE),
            ids: Vec::with_capacity(reserved),
            coords: Vec::with_capacity(reserved * 2),
        }
    }

    /// Add a point and return its 0-based insertion index.
    ///
    /// Coordinates are stored with `f32` precision.
    pub fn add(&mut self, x: f64, y: f64) -> Result<u32> {
        if self.ids.len() >= self.num_items {
            return Err(ClusterError::IndexFull(self.num_items));
        }
        let index = u32::try_from(self.ids.len()).map_err(|_| {
            ClusterError::InvalidInput(format!(
                "index cannot hold more than {} points",
                u32::MAX
            ))
        })?;

        self.ids.push(index);
        self.coords.push(x as f32);
        self.coords.push(y as f32);
        Ok(index)
    }

    /// Number of points added so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of points declared at construction.
    pub fn capacity(&self) -> usize {
        self.num_items
    }

    /// Partition the collected points into a queryable index.
    pub fn finish(mut self) -> Result<KdIndex> {
        if self.ids.len() != self.num_items {
            return Err(ClusterError::ItemCountMismatch {
                added: self.ids.len(),
                expected: self.num_items,
            });
        }

        let len = self.ids.len();
        select::sort(&mut self.ids, &mut self.coords, self.node_size, 0, len, 0);

        Ok(KdIndex {
            node_size: self.node_size,
            ids: self.ids,
            coords: self.coords,
        })
    }
}

/// Immutable k-d tree over a fixed set of 2D points.
#[derive(Debug, Clone, PartialEq)]
pub struct KdIndex {
    node_size: usize,
    ids: Vec<u32>,
    coords: Vec<f32>,
}

impl KdIndex {
    /// Build an index directly from `(x, y)` pairs.
    pub fn from_points<I>(points: I, node_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
        I::IntoIter: ExactSizeIterator,
    {
        let points = points.into_iter();
        let mut builder = IndexBuilder::with_node_size(points.len(), node_size);
        for (x, y) in points {
            builder.add(x, y)?;
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn node_size(&self) -> usize {
        self.node_size
    }

    #[inline]
    fn point(&self, i: usize) -> (f64, f64) {
        (f64::from(self.coords[2 * i]), f64::from(self.coords[2 * i + 1]))
    }

    /// Ids of all points inside `[min_x, max_x] x [min_y, max_y]` (edges inclusive),
    /// in no particular order.
    ///
    /// A box with `min_x > max_x` or `min_y > max_y` matches nothing.
    pub fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<u32> {
        if min_x.is_nan() || min_y.is_nan() || max_x.is_nan() || max_y.is_nan() {
            log::warn!("Rejecting range query with NaN coordinates");
            return Vec::new();
        }

        let inside =
            |x: f64, y: f64| x >= min_x && x <= max_x && y >= min_y && y <= max_y;

        let mut result = Vec::new();
        let mut stack: SmallVec<[Span; 64]> = SmallVec::new();
        stack.push((0, self.ids.len(), 0));

        while let Some((lo, hi, axis)) = stack.pop() {
            if hi - lo <= self.node_size {
                for i in lo..hi {
                    let (x, y) = self.point(i);
                    if inside(x, y) {
                        result.push(self.ids[i]);
                    }
                }
                continue;
            }

            let m = select::median(lo, hi);
            let (x, y) = self.point(m);
            if inside(x, y) {
                result.push(self.ids[m]);
            }

            let split = if axis == 0 { x } else { y };
            let (min, max) = if axis == 0 { (min_x, max_x) } else { (min_y, max_y) };
            if min <= split {
                stack.push((lo, m, 1 - axis));
            }
            if max >= split {
                stack.push((m + 1, hi, 1 - axis));
            }
        }

        result
    }

    /// Ids of all points whose squared distance to `(qx, qy)` is at most `r * r`,
    /// in no particular order.
    pub fn within(&self, qx: f64, qy: f64, r: f64) -> Vec<u32> {
        if qx.is_nan() || qy.is_nan() || r.is_nan() {
            log::warn!("Rejecting radius query with NaN parameters");
            return Vec::new();
        }

        let r2 = r * r;
        let near = |x: f64, y: f64| sq_dist(x, y, qx, qy) <= r2;

        let mut result = Vec::new();
        let mut stack: SmallVec<[Span; 64]> = SmallVec::new();
        stack.push((0, self.ids.len(), 0));

        while let Some((lo, hi, axis)) = stack.pop() {
            if hi - lo <= self.node_size {
                for i in lo..hi {
                    let (x, y) = self.point(i);
                    if near(x, y) {
                        result.push(self.ids[i]);
                    }
                }
                continue;
            }

            let m = select::median(lo, hi);
            let (x, y) = self.point(m);
            if near(x, y) {
                result.push(self.ids[m]);
            }

            let (q, split) = if axis == 0 { (qx, x) } else { (qy, y) };
            if q - r <= split {
                stack.push((lo, m, 1 - axis));
            }
            if q + r >= split {
                stack.push((m + 1, hi, 1 - axis));
            }
        }

        result
    }
}

#[inline]
fn sq_dist(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}
