//! # Decoder Upsampling
//!
//! Blocks that double the spatial grid inside a decoder stage.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
    tensor::{
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};
use burn_extra_ops::PixelShuffle;

use super::utils::{build_act_layer, Activation};
use crate::config::{ActivationType, DecoderUpsampling};

/// Configuration shared by every upsampling method.
#[derive(Config, Debug)]
pub struct UpsampleBlockConfig {
    pub method: DecoderUpsampling,
    pub in_channels: usize,
    pub filters: usize,
    /// Used by the transposed convolution only.
    #[config(default = "ActivationType::Relu")]
    pub activation: ActivationType,
}

impl UpsampleBlockConfig {
    pub fn init<B: Backend>(&self, device: &Device<B>) -> UpsampleBlock<B> {
        match self.method {
            DecoderUpsampling::SubpixelConv => UpsampleBlock::SubpixelConv(SubpixelConvBlock {
                conv: conv3x3(self.in_channels, self.filters * 4, device),
                shuffle: PixelShuffle::new(2),
            }),
            DecoderUpsampling::ResizeConv => UpsampleBlock::ResizeConv(ResizeConvBlock {
                conv: conv3x3(self.in_channels, self.filters, device),
            }),
            DecoderUpsampling::Deconv => UpsampleBlock::Deconv(DeconvBlock {
                deconv: ConvTranspose2dConfig::new([self.in_channels, self.filters], [3, 3])
                    .with_stride([2, 2])
                    .with_padding([1, 1])
                    .with_padding_out([1, 1])
                    .init(device),
                activation: build_act_layer(self.activation),
            }),
        }
    }
}

fn conv3x3<B: Backend>(in_channels: usize, out_channels: usize, device: &Device<B>) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

/// A x2 upsampling block.
#[derive(Module, Debug)]
pub enum UpsampleBlock<B: Backend> {
    SubpixelConv(SubpixelConvBlock<B>),
    ResizeConv(ResizeConvBlock<B>),
    Deconv(DeconvBlock<B>),
}

impl<B: Backend> UpsampleBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::SubpixelConv(block) => block.forward(x),
            Self::ResizeConv(block) => block.forward(x),
            Self::Deconv(block) => block.forward(x),
        }
    }
}

/// Convolution to `4 * filters` channels, then depth-to-space.
#[derive(Module, Debug)]
pub struct SubpixelConvBlock<B: Backend> {
    conv: Conv2d<B>,
    shuffle: PixelShuffle,
}

impl<B: Backend> SubpixelConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.shuffle.forward(self.conv.forward(x))
    }
}

/// Bilinear resize, then a 3x3 convolution.
#[derive(Module, Debug)]
pub struct ResizeConvBlock<B: Backend> {
    conv: Conv2d<B>,
}

impl<B: Backend> ResizeConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = x.dims();
        let x = interpolate(
            x,
            [height * 2, width * 2],
            InterpolateOptions::new(InterpolateMode::Bilinear),
        );
        self.conv.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct DeconvBlock<B: Backend> {
    deconv: ConvTranspose2d<B>,
    activation: Activation,
}

impl<B: Backend> DeconvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.activation.forward(self.deconv.forward(x))
    }
}
