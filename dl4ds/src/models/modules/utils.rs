use burn::{
    nn::{
        BatchNorm, BatchNormConfig, Gelu, LayerNorm, LayerNormConfig, LeakyRelu, LeakyReluConfig,
        Relu, Sigmoid, Tanh,
    },
    prelude::*,
    tensor::activation::silu,
};

use crate::config::{ActivationType, NormalizationType};

/// Normalization layer for `[batch, channels, height, width]` feature maps.
#[derive(Module, Debug)]
pub enum Normalization<B: Backend> {
    Batch(BatchNorm<B, 2>),
    /// Layer norm over the channel axis, applied in channels-last layout.
    Layer(ChannelsLastNorm<B>),
}

impl<B: Backend> Normalization<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Batch(norm) => norm.forward(x),
            Self::Layer(norm) => norm.forward(x),
        }
    }
}

/// Wraps a `LayerNorm` with the permutes needed for channels-first input.
#[derive(Module, Debug)]
pub struct ChannelsLastNorm<B: Backend> {
    norm: LayerNorm<B>,
}

impl<B: Backend> ChannelsLastNorm<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = x.permute([0, 2, 3, 1]);
        let x = self.norm.forward(x);
        x.permute([0, 3, 1, 2])
    }
}

pub fn build_norm_layer<B: Backend>(
    norm: NormalizationType,
    channels: usize,
    device: &Device<B>,
) -> Normalization<B> {
    match norm {
        NormalizationType::Batch => {
            Normalization::Batch(BatchNormConfig::new(channels).init(device))
        }
        NormalizationType::Layer => Normalization::Layer(ChannelsLastNorm {
            norm: LayerNormConfig::new(channels).init(device),
        }),
    }
}

/// Activation layer selected by [`ActivationType`].
#[derive(Module, Debug, Clone)]
pub enum Activation {
    Relu(Relu),
    LeakyRelu(LeakyRelu),
    Gelu(Gelu),
    Silu(Silu),
    Sigmoid(Sigmoid),
    Tanh(Tanh),
}

impl Activation {
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Self::Relu(act) => act.forward(x),
            Self::LeakyRelu(act) => act.forward(x),
            Self::Gelu(act) => act.forward(x),
            Self::Silu(act) => act.forward(x),
            Self::Sigmoid(act) => act.forward(x),
            Self::Tanh(act) => act.forward(x),
        }
    }
}

#[derive(Module, Debug, Clone)]
pub struct Silu;

impl Silu {
    pub const fn new() -> Self {
        Self {}
    }
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        silu(input)
    }
}

pub fn build_act_layer(act: ActivationType) -> Activation {
    match act {
        ActivationType::Relu => Activation::Relu(Relu::new()),
        ActivationType::LeakyRelu => Activation::LeakyRelu(LeakyReluConfig::new().init()),
        ActivationType::Gelu => Activation::Gelu(Gelu::new()),
        ActivationType::Silu => Activation::Silu(Silu::new()),
        ActivationType::Sigmoid => Activation::Sigmoid(Sigmoid::new()),
        ActivationType::Tanh => Activation::Tanh(Tanh::new()),
    }
}
