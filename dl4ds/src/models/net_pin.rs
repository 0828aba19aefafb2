//! # Pre-Upsampling Backbone Network
//!
//! A trunk of `n_blocks` backbone blocks at full resolution, merged back into
//! the projected input, followed by the shared output head.
//!
//! ```text
//! input -> conv_in ─┬─> blocks -> conv_out -> dropout ─> merge -> head -> output
//!                   └────────────────────────────────────┘
//! ```

use burn::{
    module::Ignored,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
};

use super::{
    head::{PinHead, PinHeadConfig},
    modules::{
        build_dropout_layer, ConvBlock, ConvBlockConfig, DenseBlock, DenseBlockConfig,
        DropoutLayer, ResidualBlock, ResidualBlockConfig, TransitionBlock, TransitionBlockConfig,
    },
    signature::ModelSignature,
};
use crate::config::{Backbone, NetPinConfig};
use crate::error::Dl4dsResult;

impl NetPinConfig {
    /// Channels of the trunk after merging, `2 * n_filters` for the dense backbone.
    #[must_use]
    pub const fn trunk_channels(&self) -> usize {
        match self.backbone {
            Backbone::Densenet => 2 * self.n_filters,
            Backbone::Convnet | Backbone::Resnet => self.n_filters,
        }
    }

    fn block_config(&self, in_channels: usize) -> ConvBlockConfig {
        ConvBlockConfig::new(in_channels, self.n_filters)
            .with_activation(Some(self.activation))
            .with_dropout_rate(self.dropout_rate)
            .with_dropout_variant(self.dropout_variant)
            .with_normalization(self.normalization)
            .with_attention(self.attention)
    }

    fn init_blocks<B: Backend>(&self, device: &Device<B>) -> (Vec<BackboneBlock<B>>, usize) {
        let mut channels = self.n_filters;
        let mut blocks = Vec::with_capacity(self.n_blocks);

        for _ in 0..self.n_blocks {
            let block = match self.backbone {
                Backbone::Convnet => BackboneBlock::Conv(self.block_config(channels).init(device)),
                Backbone::Resnet => BackboneBlock::Residual(
                    ResidualBlockConfig::new(self.block_config(channels)).init(device),
                ),
                Backbone::Densenet => {
                    let dense = DenseBlockConfig::new(self.block_config(channels));
                    let transition =
                        TransitionBlockConfig::new(dense.out_channels(), self.n_filters / 2);
                    channels = transition.filters;
                    BackboneBlock::Dense(DenseStage {
                        dense: dense.init(device),
                        transition: transition.init(device),
                    })
                }
            };
            blocks.push(block);
        }

        (blocks, channels)
    }

    /// Validates the configuration and assembles the network.
    ///
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidConfiguration)` if [`NetPinConfig::validate`]
    /// fails.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> Dl4dsResult<NetPin<B>> {
        self.validate()?;

        let conv_in = Conv2dConfig::new([self.n_channels, self.n_filters], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let (blocks, block_channels) = self.init_blocks(device);
        let conv_out = Conv2dConfig::new([block_channels, self.n_filters], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        let head = PinHeadConfig::new(
            self.trunk_channels(),
            self.n_filters,
            self.activation,
            self.dropout_rate,
        )
        .with_n_aux_channels(self.n_aux_channels)
        .with_n_channels_out(self.n_channels_out)
        .with_normalization(self.normalization)
        .with_output_activation(self.output_activation)
        .with_localcon_grid(self.localcon_layer.then_some(self.hr_size))
        .init(device);

        let signature = ModelSignature::new(
            self.model_name(),
            self.n_channels,
            self.n_aux_channels,
            self.n_channels_out,
            self.hr_size,
            self.fixed_grid(),
        );

        tracing::debug!(
            model = %signature.name,
            n_blocks = blocks.len(),
            trunk_channels = self.trunk_channels(),
            "assembled backbone network"
        );

        Ok(NetPin {
            conv_in,
            blocks,
            conv_out,
            dropout: build_dropout_layer(self.dropout_rate, self.dropout_variant),
            head,
            backbone: Ignored(self.backbone),
            signature: Ignored(signature),
        })
    }
}

/// One trunk block.
#[derive(Module, Debug)]
pub enum BackboneBlock<B: Backend> {
    Conv(ConvBlock<B>),
    Residual(ResidualBlock<B>),
    Dense(DenseStage<B>),
}

impl<B: Backend> BackboneBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Conv(block) => block.forward(x),
            Self::Residual(block) => block.forward(x),
            Self::Dense(stage) => stage.forward(x),
        }
    }
}

/// A dense block followed by its transition.
#[derive(Module, Debug)]
pub struct DenseStage<B: Backend> {
    dense: DenseBlock<B>,
    transition: TransitionBlock<B>,
}

impl<B: Backend> DenseStage<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.transition.forward(self.dense.forward(x))
    }
}

/// The assembled backbone network.
#[derive(Module, Debug)]
pub struct NetPin<B: Backend> {
    conv_in: Conv2d<B>,
    blocks: Vec<BackboneBlock<B>>,
    conv_out: Conv2d<B>,
    dropout: Option<DropoutLayer<B>>,
    head: PinHead<B>,
    backbone: Ignored<Backbone>,
    signature: Ignored<ModelSignature>,
}

impl<B: Backend> NetPin<B> {
    /// Runs the network on `input` and, if the model has one, the auxiliary input.
    ///
    /// # Errors
    ///
    /// Fails without computing anything if the inputs do not match
    /// [`NetPin::signature`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        aux: Option<Tensor<B, 4>>,
    ) -> Dl4dsResult<Tensor<B, 4>> {
        self.signature
            .check(input.dims(), aux.as_ref().map(|aux| aux.dims()))?;

        let x = self.conv_in.forward(input);
        let b = self
            .blocks
            .iter()
            .fold(x.clone(), |b, block| block.forward(b));
        let b = self.conv_out.forward(b);
        let b = match &self.dropout {
            Some(dropout) => dropout.forward(b),
            None => b,
        };

        let x = match *self.backbone {
            Backbone::Convnet => b,
            Backbone::Resnet => x + b,
            Backbone::Densenet => Tensor::cat(vec![x, b], 1),
        };

        self.head.forward(x, aux)
    }

    pub fn signature(&self) -> &ModelSignature {
        &self.signature
    }

    /// The model name, `<backbone>_pin`.
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn backbone(&self) -> Backbone {
        *self.backbone
    }

    /// Number of trunk blocks.
    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }
}
