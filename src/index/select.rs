//! In-place k-d partitioning of the parallel id / coordinate arrays.

/// Index of the split point of subrange `[lo, hi)`.
#[inline]
pub(super) fn median(lo: usize, hi: usize) -> usize {
    lo + (hi - lo) / 2
}

/// Recursively partition `[lo, hi)` so that every subrange longer than
/// `node_size` is split at its median, alternating the axis per level.
pub(super) fn sort(
    ids: &mut [u32],
    coords: &mut [f32],
    node_size: usize,
    lo: usize,
    hi: usize,
    axis: usize,
) {
    if hi - lo <= node_size {
        return;
    }

    let m = median(lo, hi);
    select(ids, coords, m, lo, hi - 1, axis);

    sort(ids, coords, node_size, lo, m, 1 - axis);
    sort(ids, coords, node_size, m + 1, hi, 1 - axis);
}

/// Floyd-Rivest selection over the inclusive range `[left, right]`.
///
/// Afterwards the element at `k` holds the value it would have in sorted
/// order along `axis`; everything before it is `<=` and everything after `>=`.
pub(super) fn select(
    ids: &mut [u32],
    coords: &mut [f32],
    k: usize,
    left: usize,
    right: usize,
    axis: usize,
) {
    let k = k as isize;
    let mut left = left as isize;
    let mut right = right as isize;
    let at = |coords: &[f32], i: isize| coords[2 * i as usize + axis];

    while right > left {
        if right - left > 600 {
            // Narrow to a sample range that very likely contains the k-th element.
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = n.ln();
            let s = 0.5 * (2.0 * z / 3.0).exp();
            let sign = if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 };
            let sd = 0.5 * (z * s * (n - s) / n).sqrt() * sign;
            let new_left = left.max((k as f64 - m * s / n + sd).floor() as isize);
            let new_right = right.min((k as f64 + (n - m) * s / n + sd).floor() as isize);
            select(
                ids,
                coords,
                k as usize,
                new_left as usize,
                new_right as usize,
                axis,
            );
        }

        let t = at(coords, k);
        let mut i = left;
        let mut j = right;

        swap_item(ids, coords, left, k);
        if at(coords, right) > t {
            swap_item(ids, coords, left, right);
        }

        while i < j {
            swap_item(ids, coords, i, j);
            i += 1;
            j -= 1;
            while at(coords, i) < t {
                i += 1;
            }
            while at(coords, j) > t {
                j -= 1;
            }
        }

        if at(coords, left) == t {
            swap_item(ids, coords, left, j);
        } else {
            j += 1;
            swap_item(ids, coords, j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            right = j - 1;
        }
    }
}

#[inline]
fn swap_item(ids: &mut [u32], coords: &mut [f32], i: isize, j: isize) {
    let (i, j) = (i as usize, j as usize);
    ids.swap(i, j);
    coords.swap(2 * i, 2 * j);
    coords.swap(2 * i + 1, 2 * j + 1);
}
