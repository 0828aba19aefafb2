//! # Spatial Padding
//!
//! Zero-pads the two trailing (spatial) dimensions of a tensor up to a target size.
//! The missing rows/columns are split evenly, with the odd one going after the data.

use burn::prelude::*;

/// Splits a size difference into `(before, after)` padding amounts.
pub const fn split_padding(diff: usize) -> (usize, usize) {
    let before = diff / 2;
    (before, diff - before)
}

/// Zero-pads `x` so its last two dimensions become `[height, width]`.
///
/// Dimensions already at (or above) the target are left untouched; this never crops.
pub fn pad_to<B: Backend, const D: usize>(
    x: Tensor<B, D>,
    [height, width]: [usize; 2],
) -> Tensor<B, D> {
    let dims = x.dims();
    let h = dims[D - 2];
    let w = dims[D - 1];
    if h >= height && w >= width {
        return x;
    }
    let (top, bottom) = split_padding(height.saturating_sub(h));
    let (left, right) = split_padding(width.saturating_sub(w));

    x.pad((left, right, top, bottom), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_split_padding() {
        assert_eq!(split_padding(0), (0, 0));
        assert_eq!(split_padding(1), (0, 1));
        assert_eq!(split_padding(3), (1, 2));
    }

    #[test]
    fn test_pad_to_odd() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([1, 2, 4, 6], &device);

        let y = pad_to(x, [5, 7]);

        assert_eq!(y.dims(), [1, 2, 5, 7]);
        // Original content sits in the top-left corner; the extra row/column is zero.
        let total = y.clone().sum().into_scalar().elem::<f32>();
        assert_eq!(total, 48.0);
        let last_row = y
            .slice([0..1, 0..2, 4..5, 0..7])
            .sum()
            .into_scalar()
            .elem::<f32>();
        assert_eq!(last_row, 0.0);
    }

    #[test]
    fn test_pad_to_noop() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([1, 1, 4, 4], &device);

        let y = pad_to(x, [3, 4]);

        assert_eq!(y.dims(), [1, 1, 4, 4]);
    }
}
