//! Additional operations for the Burn deep learning framework
//!
//! This crate provides operations that are commonly used in image-to-image networks
//! but are not yet available in the core Burn framework.

use burn::prelude::*;

mod dropout;
mod pad;
mod pixel_shuffle;

// Convenient re-exports
pub use dropout::{
    GaussianDropout, GaussianDropoutConfig, McDropout, McDropoutConfig, SpatialDropout,
    SpatialDropoutConfig,
};
pub use pad::{pad_to, split_padding};
pub use pixel_shuffle::{pixel_shuffle, PixelShuffle};

/// Additional operations for Burn image tensors
pub trait TensorExtraOps<B: Backend> {
    /// Depth-to-space rearrangement, see [`pixel_shuffle`].
    fn pixel_shuffle(self, upscale_factor: usize) -> Self;

    /// Zero-pad the spatial dimensions up to `size`, see [`pad_to`].
    fn pad_to(self, size: [usize; 2]) -> Self;
}

impl<B: Backend> TensorExtraOps<B> for Tensor<B, 4> {
    fn pixel_shuffle(self, upscale_factor: usize) -> Self {
        pixel_shuffle(self, upscale_factor)
    }

    fn pad_to(self, size: [usize; 2]) -> Self {
        pad_to(self, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Tensor};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_tensor_extra_ops() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 4>::random(
            [2, 8, 3, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let upsampled = tensor.pixel_shuffle(2);
        assert_eq!(upsampled.dims(), [2, 2, 6, 10]);

        let padded = upsampled.pad_to([7, 11]);
        assert_eq!(padded.dims(), [2, 2, 7, 11]);
    }
}
