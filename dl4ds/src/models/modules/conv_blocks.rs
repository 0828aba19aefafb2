//! # Convolution Blocks
//!
//! The repeated building blocks of both networks. Every block keeps the spatial
//! grid of its input except [`EncoderBlock`], which also returns a half-resolution
//! copy.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        PaddingConfig2d, Relu,
    },
    prelude::*,
};

use super::{
    attention::{ChannelAttention, ChannelAttentionConfig},
    dropout::{build_dropout_layer, DropoutLayer},
    utils::{build_act_layer, build_norm_layer, Activation, Normalization},
};
use crate::config::{ActivationType, DropoutVariant, NormalizationType};

/// Two 3x3 convolutions, each followed by optional dropout, normalization and
/// activation, then optional channel attention.
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    pub in_channels: usize,
    pub filters: usize,
    #[config(default = "Some(ActivationType::Relu)")]
    pub activation: Option<ActivationType>,
    #[config(default = 0.0)]
    pub dropout_rate: f64,
    #[config(default = "DropoutVariant::Bernoulli")]
    pub dropout_variant: DropoutVariant,
    #[config(default = "None")]
    pub normalization: Option<NormalizationType>,
    #[config(default = false)]
    pub attention: bool,
}

impl ConvBlockConfig {
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ConvBlock<B> {
        let conv1 = Conv2dConfig::new([self.in_channels, self.filters], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([self.filters, self.filters], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        let norm = |norm| build_norm_layer(norm, self.filters, device);

        ConvBlock {
            conv1,
            conv2,
            dropout: build_dropout_layer(self.dropout_rate, self.dropout_variant),
            norm1: self.normalization.map(norm),
            norm2: self.normalization.map(norm),
            activation: self.activation.map(build_act_layer),
            attention: self
                .attention
                .then(|| ChannelAttentionConfig::new(self.filters).init(device)),
        }
    }
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    dropout: Option<DropoutLayer<B>>,
    norm1: Option<Normalization<B>>,
    norm2: Option<Normalization<B>>,
    activation: Option<Activation>,
    attention: Option<ChannelAttention<B>>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.stage(self.conv1.forward(x), self.norm1.as_ref());
        let x = self.stage(self.conv2.forward(x), self.norm2.as_ref());

        match &self.attention {
            Some(attention) => attention.forward(x),
            None => x,
        }
    }

    /// Whether channel attention closes the block.
    pub fn has_attention(&self) -> bool {
        self.attention.is_some()
    }

    /// Whether both convolutions are followed by a normalization layer.
    pub fn has_normalization(&self) -> bool {
        self.norm1.is_some() && self.norm2.is_some()
    }

    fn stage(&self, x: Tensor<B, 4>, norm: Option<&Normalization<B>>) -> Tensor<B, 4> {
        let x = match &self.dropout {
            Some(dropout) => dropout.forward(x),
            None => x,
        };
        let x = match norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        match &self.activation {
            Some(activation) => activation.forward(x),
            None => x,
        }
    }
}

/// A [`ConvBlock`] with an identity skip; input and output have `filters` channels.
#[derive(Config, Debug)]
pub struct ResidualBlockConfig {
    pub block: ConvBlockConfig,
}

impl ResidualBlockConfig {
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ResidualBlock<B> {
        let block = ConvBlockConfig {
            in_channels: self.block.filters,
            ..self.block.clone()
        };
        ResidualBlock {
            block: block.init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    block: ConvBlock<B>,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        x.clone() + self.block.forward(x)
    }
}

/// A [`ConvBlock`] whose output is concatenated to its input.
#[derive(Config, Debug)]
pub struct DenseBlockConfig {
    pub block: ConvBlockConfig,
}

impl DenseBlockConfig {
    /// Channels produced by the block: `in_channels + filters`.
    #[must_use]
    pub const fn out_channels(&self) -> usize {
        self.block.in_channels + self.block.filters
    }

    pub fn init<B: Backend>(&self, device: &Device<B>) -> DenseBlock<B> {
        DenseBlock {
            block: self.block.init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    block: ConvBlock<B>,
}

impl<B: Backend> DenseBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let y = self.block.forward(x.clone());
        Tensor::cat(vec![x, y], 1)
    }
}

/// 1x1 channel reduction used between dense blocks.
#[derive(Config, Debug)]
pub struct TransitionBlockConfig {
    pub in_channels: usize,
    pub filters: usize,
}

impl TransitionBlockConfig {
    pub fn init<B: Backend>(&self, device: &Device<B>) -> TransitionBlock<B> {
        TransitionBlock {
            conv: Conv2dConfig::new([self.in_channels, self.filters], [1, 1]).init(device),
            relu: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct TransitionBlock<B: Backend> {
    conv: Conv2d<B>,
    relu: Relu,
}

impl<B: Backend> TransitionBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.relu.forward(self.conv.forward(x))
    }
}

/// A [`ConvBlock`] followed by 2x2 max pooling.
#[derive(Config, Debug)]
pub struct EncoderBlockConfig {
    pub block: ConvBlockConfig,
}

impl EncoderBlockConfig {
    pub fn init<B: Backend>(&self, device: &Device<B>) -> EncoderBlock<B> {
        EncoderBlock {
            block: self.block.init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    block: ConvBlock<B>,
    pool: MaxPool2d,
}

impl<B: Backend> EncoderBlock<B> {
    /// Returns `(downsampled, skip)`. The downsampled grid is the floor half of
    /// the skip grid.
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let skip = self.block.forward(x);
        let down = self.pool.forward(skip.clone());
        (down, skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn input(shape: [usize; 4]) -> Tensor<TestBackend, 4> {
        Tensor::random(
            shape,
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &Default::default(),
        )
    }

    #[test]
    fn test_conv_block_changes_channels_only() {
        let device = Default::default();
        let block = ConvBlockConfig::new(3, 16)
            .with_normalization(Some(NormalizationType::Batch))
            .with_dropout_rate(0.2)
            .with_dropout_variant(DropoutVariant::Spatial)
            .with_attention(true)
            .init::<TestBackend>(&device);

        assert!(block.has_attention());
        assert!(block.has_normalization());
        assert_eq!(block.forward(input([2, 3, 9, 7])).dims(), [2, 16, 9, 7]);
    }

    #[test]
    fn test_conv_block_defaults_are_bare() {
        let device = Default::default();
        let block = ConvBlockConfig::new(3, 16).init::<TestBackend>(&device);

        assert!(!block.has_attention());
        assert!(!block.has_normalization());
    }

    #[test]
    fn test_conv_block_without_activation_can_go_negative() {
        let device = Default::default();
        let block = ConvBlockConfig::new(4, 8)
            .with_activation(None)
            .init::<TestBackend>(&device);

        let min = block
            .forward(input([1, 4, 8, 8]))
            .min()
            .into_scalar()
            .elem::<f32>();
        assert!(min < 0.0);
    }

    #[test]
    fn test_relu_block_is_non_negative() {
        let device = Default::default();
        let block = ConvBlockConfig::new(4, 8).init::<TestBackend>(&device);

        let min = block
            .forward(input([1, 4, 8, 8]))
            .min()
            .into_scalar()
            .elem::<f32>();
        assert!(min >= 0.0);
    }

    #[test]
    fn test_residual_block_keeps_width() {
        let device = Default::default();
        let block =
            ResidualBlockConfig::new(ConvBlockConfig::new(8, 8)).init::<TestBackend>(&device);

        assert_eq!(block.forward(input([1, 8, 6, 6])).dims(), [1, 8, 6, 6]);
    }

    #[test]
    fn test_dense_and_transition_channels() {
        let device = Default::default();
        let config = DenseBlockConfig::new(ConvBlockConfig::new(8, 16));
        assert_eq!(config.out_channels(), 24);

        let dense = config.init::<TestBackend>(&device);
        let y = dense.forward(input([1, 8, 5, 5]));
        assert_eq!(y.dims(), [1, 24, 5, 5]);

        let transition = TransitionBlockConfig::new(24, 8).init::<TestBackend>(&device);
        assert_eq!(transition.forward(y).dims(), [1, 8, 5, 5]);
    }

    #[test]
    fn test_encoder_block_floors_odd_grids() {
        let device = Default::default();
        let block =
            EncoderBlockConfig::new(ConvBlockConfig::new(1, 4)).init::<TestBackend>(&device);

        let (down, skip) = block.forward(input([2, 1, 11, 8]));
        assert_eq!(skip.dims(), [2, 4, 11, 8]);
        assert_eq!(down.dims(), [2, 4, 5, 4]);
    }
}
