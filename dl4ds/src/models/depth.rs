//! # Encoder Depth Validation
//!
//! An encoder-decoder halves its grid once per encoder stage. These helpers keep
//! the deepest grid at least 2x2.

/// `size` after `depth` floor halvings.
#[must_use]
pub fn halved(size: usize, depth: usize) -> usize {
    u32::try_from(depth)
        .ok()
        .and_then(|depth| size.checked_shr(depth))
        .unwrap_or(0)
}

/// Reduces `n_blocks` until `depth` halvings of `shape` leave both dimensions
/// at least 2, warning once per reduction.
///
/// Grids with a dimension below 2 end at depth 0 (no downsampling).
#[must_use]
pub fn check_n_blocks(shape: [usize; 2], n_blocks: usize) -> usize {
    let [height, width] = shape;
    let mut depth = n_blocks;

    while depth > 0 && (halved(height, depth) < 2 || halved(width, depth) < 2) {
        tracing::warn!(
            "`n_blocks` is too large, cannot downsample {depth} times given the input grid \
             size {shape:?}. Setting `n_blocks` to {}",
            depth - 1
        );
        depth -= 1;
    }

    depth
}

/// The grid of every encoder stage input, from `shape` down to the bottleneck.
///
/// The returned list has `depth + 1` entries.
#[must_use]
pub fn grid_plan(shape: [usize; 2], depth: usize) -> Vec<[usize; 2]> {
    (0..=depth)
        .map(|stage| [halved(shape[0], stage), halved(shape[1], stage)])
        .collect()
}
