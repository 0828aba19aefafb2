//! # Pixel Shuffle
//!
//! Rearranges channel blocks into spatial blocks (depth-to-space), the core of
//! sub-pixel convolution upsampling.

use burn::prelude::*;

/// Rearranges `[batch, channels * r * r, height, width]` into
/// `[batch, channels, height * r, width * r]`.
///
/// # Panics
///
/// If the channel dimension is not divisible by `upscale_factor^2`.
pub fn pixel_shuffle<B: Backend>(x: Tensor<B, 4>, upscale_factor: usize) -> Tensor<B, 4> {
    let r = upscale_factor;
    let [batch, channels, height, width] = x.dims();
    let area = r * r;
    assert!(
        channels % area == 0,
        "channels ({channels}) must be divisible by upscale_factor^2 ({area})"
    );
    let out_channels = channels / area;

    x.reshape([batch, out_channels, r, r, height, width])
        .permute([0, 1, 4, 2, 5, 3])
        .reshape([batch, out_channels, height * r, width * r])
}

/// `pixel_shuffle` as a module.
#[derive(Module, Clone, Debug)]
pub struct PixelShuffle {
    upscale_factor: usize,
}

impl PixelShuffle {
    /// Creates a new `PixelShuffle` with the given factor.
    pub const fn new(upscale_factor: usize) -> Self {
        Self { upscale_factor }
    }

    /// The spatial upscale factor.
    pub const fn upscale_factor(&self) -> usize {
        self.upscale_factor
    }

    /// See [`pixel_shuffle`].
    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        pixel_shuffle(x, self.upscale_factor)
    }
}
