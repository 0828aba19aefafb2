use burn::prelude::*;
use burn_extra_ops::TensorExtraOps;

use crate::error::{Dl4dsError, Dl4dsResult};

/// Concatenates two feature maps along channels, zero-padding each spatial axis
/// of the smaller one to the larger size.
///
/// Padding is split evenly with the odd pixel after, as in
/// [`burn_extra_ops::split_padding`].
///
/// # Errors
///
/// Returns `Err(Dl4dsError::ShapeMismatch)` if the batch sizes differ.
pub fn pad_concat<B: Backend>(a: Tensor<B, 4>, b: Tensor<B, 4>) -> Dl4dsResult<Tensor<B, 4>> {
    let [batch_a, _, height_a, width_a] = a.dims();
    let [batch_b, _, height_b, width_b] = b.dims();

    if batch_a != batch_b {
        return Err(Dl4dsError::ShapeMismatch {
            operation: "pad_concat".to_string(),
            reason: format!("batch sizes differ: {batch_a} vs {batch_b}"),
        });
    }

    let grid = [height_a.max(height_b), width_a.max(width_b)];
    Ok(Tensor::cat(vec![a.pad_to(grid), b.pad_to(grid)], 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_pads_smaller_tensor() {
        let device = Default::default();
        let upsampled = Tensor::<TestBackend, 4>::ones([2, 3, 10, 6], &device);
        let skip = Tensor::<TestBackend, 4>::ones([2, 5, 11, 7], &device);

        let merged = pad_concat(upsampled, skip).unwrap();
        assert_eq!(merged.dims(), [2, 8, 11, 7]);

        // the missing row and column land after the data
        let padded = merged.slice([0..1, 0..1, 10..11, 0..7]);
        assert_eq!(padded.sum().into_scalar().elem::<f32>(), 0.0);
    }

    #[test]
    fn test_batch_mismatch_fails() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 4>::ones([1, 3, 4, 4], &device);
        let b = Tensor::<TestBackend, 4>::ones([2, 3, 4, 4], &device);

        assert!(matches!(
            pad_concat(a, b),
            Err(Dl4dsError::ShapeMismatch { .. })
        ));
    }
}
