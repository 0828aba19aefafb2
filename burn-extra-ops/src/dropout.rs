//! # Dropout Variants
//!
//! Dropout layers that `burn::nn` does not provide:
//!
//! - [`GaussianDropout`]: multiplicative noise drawn from `N(1, sqrt(p / (1 - p)))`.
//! - [`SpatialDropout`]: drops entire feature maps of a `[batch, channels, height, width]`
//!   tensor and rescales the survivors.
//! - [`McDropout`]: element-wise Bernoulli dropout that stays active at inference.
//!
//! Regular layers are only active when the backend has autodiff enabled, mirroring
//! `burn::nn::Dropout`. Layers built with `monte_carlo = true` sample a new mask on
//! every call, which is what Monte-Carlo uncertainty estimation needs.

use burn::{prelude::*, tensor::Distribution};

/// Returns true when a dropout layer should modify its input.
fn is_active<B: Backend>(prob: f64, monte_carlo: bool) -> bool {
    prob > 0.0 && (monte_carlo || B::ad_enabled())
}

/// Configuration for the `GaussianDropout` module.
#[derive(Config, Debug)]
pub struct GaussianDropoutConfig {
    /// The drop rate used to derive the noise standard deviation.
    pub prob: f64,
    /// Keep the layer active outside of training.
    #[config(default = "false")]
    pub monte_carlo: bool,
}

impl GaussianDropoutConfig {
    /// Initializes a new `GaussianDropout` module.
    pub const fn init<B: Backend>(&self) -> GaussianDropout<B> {
        GaussianDropout {
            prob: self.prob,
            monte_carlo: self.monte_carlo,
            _phantom: core::marker::PhantomData,
        }
    }
}

/// Multiplicative Gaussian noise with mean 1.
#[derive(Module, Debug)]
pub struct GaussianDropout<B: Backend> {
    prob: f64,
    monte_carlo: bool,
    _phantom: core::marker::PhantomData<B>,
}

impl<B: Backend> GaussianDropout<B> {
    /// Standard deviation of the multiplicative noise.
    pub fn stddev(&self) -> f64 {
        (self.prob / (1.0 - self.prob)).sqrt()
    }

    /// Applies the noise; returns the input unchanged when inactive.
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        if !is_active::<B>(self.prob, self.monte_carlo) {
            return x;
        }
        let noise = Tensor::random(
            x.shape(),
            Distribution::Normal(1.0, self.stddev()),
            &x.device(),
        );
        x * noise
    }
}

/// Configuration for the `SpatialDropout` module.
#[derive(Config, Debug)]
pub struct SpatialDropoutConfig {
    /// The probability of dropping a channel.
    pub prob: f64,
    /// Keep the layer active outside of training.
    #[config(default = "false")]
    pub monte_carlo: bool,
}

impl SpatialDropoutConfig {
    /// Initializes a new `SpatialDropout` module.
    pub const fn init<B: Backend>(&self) -> SpatialDropout<B> {
        SpatialDropout {
            prob: self.prob,
            monte_carlo: self.monte_carlo,
            _phantom: core::marker::PhantomData,
        }
    }
}

/// Channel-wise dropout for feature maps.
#[derive(Module, Debug)]
pub struct SpatialDropout<B: Backend> {
    prob: f64,
    monte_carlo: bool,
    _phantom: core::marker::PhantomData<B>,
}

impl<B: Backend> SpatialDropout<B> {
    /// Drops whole channels.
    ///
    /// # Shapes
    /// - input: `[batch, channels, height, width]`
    /// - output: `[batch, channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        if !is_active::<B>(self.prob, self.monte_carlo) {
            return x;
        }
        let keep_prob = 1.0 - self.prob;
        let [batch, channels, _, _] = x.dims();

        // One draw per feature map, broadcast over the grid.
        let mask = Tensor::random(
            [batch, channels, 1, 1],
            Distribution::Bernoulli(keep_prob),
            &x.device(),
        );

        x * mask / keep_prob
    }
}

/// Configuration for the `McDropout` module.
#[derive(Config, Debug)]
pub struct McDropoutConfig {
    /// The probability of dropping an element.
    pub prob: f64,
}

impl McDropoutConfig {
    /// Initializes a new `McDropout` module.
    pub const fn init<B: Backend>(&self) -> McDropout<B> {
        McDropout {
            prob: self.prob,
            _phantom: core::marker::PhantomData,
        }
    }
}

/// Element-wise Bernoulli dropout that is never switched off.
#[derive(Module, Debug)]
pub struct McDropout<B: Backend> {
    prob: f64,
    _phantom: core::marker::PhantomData<B>,
}

impl<B: Backend> McDropout<B> {
    /// Zeroes each element with probability `prob` and rescales the rest.
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        if !is_active::<B>(self.prob, true) {
            return x;
        }
        let keep_prob = 1.0 - self.prob;
        let mask = Tensor::random(x.shape(), Distribution::Bernoulli(keep_prob), &x.device());

        x * mask / keep_prob
    }
}
