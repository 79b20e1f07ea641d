//! Conversion of raster masks into polygon regions.
//!
//! Assisted segmentation produces a per-pixel probability map. The map is
//! thresholded into a binary mask, and the borders of the foreground blobs
//! (and of any holes in them) are traced into polygon rings.

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use ndarray::Array2;

use crate::model::{Point2, Ring};

/// Probability at or above which a pixel counts as foreground.
pub const MASK_THRESHOLD: f32 = 0.5;

/// Rings with fewer vertices than this are dropped as degenerate.
const MIN_RING_VERTICES: usize = 3;

/// Threshold a `height x width` probability map into a binary mask.
pub fn threshold_mask(probabilities: &Array2<f32>, threshold: f32) -> Array2<bool> {
    probabilities.mapv(|p| p >= threshold)
}

/// Trace the foreground of a `height x width` mask into polygon rings.
///
/// Every outer border and every hole border becomes one ring, in pixel
/// coordinates. With `sort_decreasing_area` the rings are ordered largest
/// area first, with equal areas kept in discovery (raster) order. A mask
/// with no foreground gives no rings.
pub fn mask_to_regions(mask: &Array2<bool>, sort_decreasing_area: bool) -> Vec<Ring> {
    if !mask.iter().any(|&on| on) {
        return Vec::new();
    }

    let (height, width) = mask.dim();
    // One pixel of background around the mask so blobs touching the edge
    // still get a closed border.
    let mut padded = GrayImage::new(width as u32 + 2, height as u32 + 2);
    for ((y, x), &on) in mask.indexed_iter() {
        if on {
            padded.put_pixel(x as u32 + 1, y as u32 + 1, Luma([255]));
        }
    }

    let mut regions: Vec<Ring> = find_contours::<i32>(&padded)
        .into_iter()
        .map(|contour| {
            let ring: Ring = contour
                .points
                .iter()
                .map(|p| Point2::new(f64::from(p.x - 1), f64::from(p.y - 1)))
                .collect();
            simplify_ring(&ring)
        })
        .filter(|ring| ring.len() >= MIN_RING_VERTICES)
        .collect();

    if sort_decreasing_area {
        // sort_by is stable, so ties keep discovery order
        regions.sort_by(|a, b| ring_area(b).total_cmp(&ring_area(a)));
    }

    log::debug!(
        "Traced {} region(s) from {}x{} mask",
        regions.len(),
        width,
        height
    );
    regions
}

/// Absolute area of a ring (shoelace formula).
pub fn ring_area(ring: &[Point2]) -> f64 {
    if ring.len() < MIN_RING_VERTICES {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}

/// Drop repeated vertices and vertices in the middle of straight runs.
fn simplify_ring(ring: &[Point2]) -> Ring {
    let mut deduped: Ring = Vec::with_capacity(ring.len());
    for &point in ring {
        if deduped.last() != Some(&point) {
            deduped.push(point);
        }
    }
    while deduped.len() > 1 && deduped.first() == deduped.last() {
        deduped.pop();
    }

    let n = deduped.len();
    if n < MIN_RING_VERTICES {
        return deduped;
    }

    (0..n)
        .filter(|&i| {
            let prev = deduped[(i + n - 1) % n];
            let cur = deduped[i];
            let next = deduped[(i + 1) % n];
            let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
            let (bx, by) = (next.x - cur.x, next.y - cur.y);
            let cross = ax * by - ay * bx;
            let dot = ax * bx + ay * by;
            // Keep corners and reversals; drop points continuing straight on.
            cross != 0.0 || dot <= 0.0
        })
        .map(|i| deduped[i])
        .collect()
}
