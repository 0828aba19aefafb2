//! # Dropout Dispatch
//!
//! Maps a [`DropoutVariant`] and rate to a concrete dropout layer.

use burn::{
    nn::{Dropout, DropoutConfig},
    prelude::*,
};
use burn_extra_ops::{
    GaussianDropout, GaussianDropoutConfig, McDropout, McDropoutConfig, SpatialDropout,
    SpatialDropoutConfig,
};

use crate::config::DropoutVariant;

/// A dropout layer of any supported variant.
#[derive(Module, Debug)]
pub enum DropoutLayer<B: Backend> {
    /// Standard dropout, active only while training.
    Bernoulli(Dropout),
    /// Standard dropout that is always active.
    McBernoulli(McDropout<B>),
    /// Gaussian dropout; the Monte-Carlo flag lives in the layer.
    Gaussian(GaussianDropout<B>),
    /// Spatial dropout; the Monte-Carlo flag lives in the layer.
    Spatial(SpatialDropout<B>),
}

impl<B: Backend> DropoutLayer<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Bernoulli(layer) => layer.forward(x),
            Self::McBernoulli(layer) => layer.forward(x),
            Self::Gaussian(layer) => layer.forward(x),
            Self::Spatial(layer) => layer.forward(x),
        }
    }
}

/// Builds the dropout layer for `variant`, or `None` when `rate` is zero.
pub fn build_dropout_layer<B: Backend>(
    rate: f64,
    variant: DropoutVariant,
) -> Option<DropoutLayer<B>> {
    if rate <= 0.0 {
        return None;
    }
    let monte_carlo = variant.is_monte_carlo();
    let layer = match variant {
        DropoutVariant::Bernoulli => DropoutLayer::Bernoulli(DropoutConfig::new(rate).init()),
        DropoutVariant::McBernoulli => DropoutLayer::McBernoulli(McDropoutConfig::new(rate).init()),
        DropoutVariant::Gaussian | DropoutVariant::McGaussian => {
            let config = GaussianDropoutConfig::new(rate).with_monte_carlo(monte_carlo);
            DropoutLayer::Gaussian(config.init())
        }
        DropoutVariant::Spatial | DropoutVariant::McSpatial => {
            let config = SpatialDropoutConfig::new(rate).with_monte_carlo(monte_carlo);
            DropoutLayer::Spatial(config.init())
        }
    };
    Some(layer)
}
