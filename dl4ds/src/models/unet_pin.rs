//! # Pre-Upsampling Encoder-Decoder Network
//!
//! `depth` encoder stages halve the grid and double the filters (capped at
//! [`MAX_FILTERS`]), a bottleneck block runs at the deepest grid, and `depth`
//! decoder stages upsample, concatenate the matching skip tensor and refine. The
//! output head is shared with the backbone network.
//!
//! The requested `n_blocks` is reduced by [`check_n_blocks`] so the deepest grid
//! of `hr_size` stays at least 2x2.

use burn::{module::Ignored, prelude::*};

use super::{
    depth::{check_n_blocks, grid_plan, halved},
    head::{PinHead, PinHeadConfig},
    modules::{
        pad_concat, ConvBlock, ConvBlockConfig, EncoderBlock, EncoderBlockConfig, UpsampleBlock,
        UpsampleBlockConfig,
    },
    signature::{ModelSignature, INPUT_NAME},
};
use crate::config::{filter_schedule, UnetPinConfig, MAX_FILTERS};
use crate::error::{Dl4dsError, Dl4dsResult};

impl UnetPinConfig {
    fn block_config(&self, in_channels: usize, filters: usize) -> ConvBlockConfig {
        ConvBlockConfig::new(in_channels, filters)
            .with_activation(Some(self.activation))
            .with_dropout_rate(self.dropout_rate)
            .with_dropout_variant(self.dropout_variant)
            .with_normalization(self.normalization)
            .with_attention(self.attention)
    }

    /// Validates the configuration, fits the depth to `hr_size` and assembles the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidConfiguration)` if [`UnetPinConfig::validate`]
    /// fails and `Err(Dl4dsError::ShapeMismatch)` if a decoder stage could not be
    /// concatenated with its skip tensor on `hr_size`.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> Dl4dsResult<UnetPin<B>> {
        self.validate()?;

        let depth = check_n_blocks(self.hr_size, self.n_blocks);
        check_skip_shapes(self.hr_size, depth)?;

        let encoder_filters = filter_schedule(self.n_filters, depth);

        let mut channels = self.n_channels;
        let mut encoders = Vec::with_capacity(depth);
        for &filters in &encoder_filters {
            let block = self.block_config(channels, filters);
            encoders.push(EncoderBlockConfig::new(block).init(device));
            channels = filters;
        }

        let bottleneck_filters = match encoder_filters.last() {
            Some(&filters) => MAX_FILTERS.min(filters.saturating_mul(2)),
            None => self.n_filters,
        };
        let bottleneck = self
            .block_config(channels, bottleneck_filters)
            .with_normalization(None)
            .init(device);
        channels = bottleneck_filters;

        let mut decoders = Vec::with_capacity(depth);
        for &filters in encoder_filters.iter().rev() {
            let upsample = UpsampleBlockConfig::new(self.decoder_upsampling, channels, filters)
                .with_activation(self.activation)
                .init(device);
            let block = self.block_config(2 * filters, filters).init(device);
            decoders.push(DecoderStage { upsample, block });
            channels = filters;
        }

        let head = PinHeadConfig::new(channels, self.n_filters, self.activation, self.dropout_rate)
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
            requested_depth = self.n_blocks,
            depth,
            filters = ?encoder_filters,
            bottleneck_filters,
            "assembled encoder-decoder network"
        );

        Ok(UnetPin {
            encoders,
            bottleneck,
            decoders,
            head,
            encoder_filters: Ignored(encoder_filters),
            signature: Ignored(signature),
        })
    }
}

/// Checks that every decoder stage, upsampling `grid / 2^k` by two, lands on or
/// one pixel short of the skip tensor recorded at `grid / 2^(k-1)`.
///
/// A depth returned by [`check_n_blocks`] always passes; this re-checks that
/// guarantee before any layer is allocated.
fn check_skip_shapes(grid: [usize; 2], depth: usize) -> Dl4dsResult<()> {
    let plan = grid_plan(grid, depth);

    for (stage, pair) in plan.windows(2).enumerate().rev() {
        let (skip, down) = (pair[0], pair[1]);
        for axis in 0..2 {
            let upsampled = down[axis] * 2;
            if upsampled > skip[axis] || skip[axis] - upsampled > 1 || down[axis] == 0 {
                return Err(Dl4dsError::ShapeMismatch {
                    operation: format!("skip connection {}", stage + 1),
                    reason: format!(
                        "upsampled grid {:?} cannot be padded to skip grid {skip:?}",
                        [down[0] * 2, down[1] * 2]
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Upsampling, skip concatenation and refinement of one decoder stage.
#[derive(Module, Debug)]
pub struct DecoderStage<B: Backend> {
    upsample: UpsampleBlock<B>,
    block: ConvBlock<B>,
}

impl<B: Backend> DecoderStage<B> {
    /// # Errors
    ///
    /// Propagates [`pad_concat`] errors.
    pub fn forward(&self, x: Tensor<B, 4>, skip: Tensor<B, 4>) -> Dl4dsResult<Tensor<B, 4>> {
        let x = pad_concat(self.upsample.forward(x), skip)?;
        Ok(self.block.forward(x))
    }
}

/// The assembled encoder-decoder network.
#[derive(Module, Debug)]
pub struct UnetPin<B: Backend> {
    encoders: Vec<EncoderBlock<B>>,
    bottleneck: ConvBlock<B>,
    decoders: Vec<DecoderStage<B>>,
    head: PinHead<B>,
    encoder_filters: Ignored<Vec<usize>>,
    signature: Ignored<ModelSignature>,
}

impl<B: Backend> UnetPin<B> {
    /// Runs the network on `input` and, if the model has one, the auxiliary input.
    ///
    /// # Errors
    ///
    /// Fails without computing anything if the inputs do not match
    /// [`UnetPin::signature`] or if the grid is too small for [`UnetPin::depth`]
    /// halvings.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        aux: Option<Tensor<B, 4>>,
    ) -> Dl4dsResult<Tensor<B, 4>> {
        let dims = input.dims();
        self.signature
            .check(dims, aux.as_ref().map(|aux| aux.dims()))?;

        let depth = self.depth();
        if halved(dims[2], depth) == 0 || halved(dims[3], depth) == 0 {
            let min_size = 1usize << depth;
            return Err(Dl4dsError::InvalidTensorShape {
                tensor: INPUT_NAME.to_string(),
                expected: format!("a grid of at least {min_size}x{min_size} for depth {depth}"),
                actual: format!("{dims:?}"),
            });
        }

        let mut skips = Vec::with_capacity(depth);
        let mut x = input;
        for encoder in &self.encoders {
            let (down, skip) = encoder.forward(x);
            skips.push(skip);
            x = down;
        }

        let mut x = self.bottleneck.forward(x);
        for (decoder, skip) in self.decoders.iter().zip(skips.into_iter().rev()) {
            x = decoder.forward(x, skip)?;
        }

        self.head.forward(x, aux)
    }

    /// Effective encoder depth, equal to the number of decoder stages.
    pub fn depth(&self) -> usize {
        self.encoders.len()
    }

    /// Filters of each encoder stage.
    pub fn encoder_filters(&self) -> &[usize] {
        &self.encoder_filters
    }

    /// Filters of each decoder stage: the encoder filters in reverse.
    pub fn decoder_filters(&self) -> Vec<usize> {
        self.encoder_filters.iter().rev().copied().collect()
    }

    pub fn signature(&self) -> &ModelSignature {
        &self.signature
    }

    /// The model name, `<backbone>_pin`.
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backbone, DecoderUpsampling, DropoutVariant, NormalizationType};
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
    fn test_depth_is_reduced_to_fit_the_grid() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Resnet, 1, 0, 4, 5, [8, 8])
            .init::<TestBackend>(&device)
            .unwrap();

        assert_eq!(model.depth(), 2);
        assert_eq!(model.decoder_filters().len(), 2);
        let y = model.forward(input([1, 1, 8, 8]), None).unwrap();
        assert_eq!(y.dims(), [1, 1, 8, 8]);
    }

    #[test]
    fn test_filter_schedule_is_mirrored() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Convnet, 1, 0, 32, 4, [32, 32])
            .with_dropout_rate(0.0)
            .init::<TestBackend>(&device)
            .unwrap();

        assert_eq!(model.encoder_filters(), &[32, 64, 128, 256]);
        assert_eq!(model.decoder_filters(), vec![256, 128, 64, 32]);
    }

    #[test]
    fn test_every_upsampling_method_preserves_resolution() {
        let device = Default::default();
        for method in [
            DecoderUpsampling::SubpixelConv,
            DecoderUpsampling::ResizeConv,
            DecoderUpsampling::Deconv,
        ] {
            let model = UnetPinConfig::new(Backbone::Convnet, 2, 0, 4, 2, [16, 16])
                .with_decoder_upsampling(method)
                .with_n_channels_out(2)
                .init::<TestBackend>(&device)
                .unwrap();

            let y = model.forward(input([2, 2, 16, 16]), None).unwrap();
            assert_eq!(y.dims(), [2, 2, 16, 16], "{method}");
        }
    }

    #[test]
    fn test_odd_grids_are_padded() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Densenet, 1, 0, 4, 3, [11, 11])
            .with_normalization(Some(NormalizationType::Batch))
            .with_attention(true)
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(model.depth(), 2);

        let y = model.forward(input([1, 1, 11, 11]), None).unwrap();
        assert_eq!(y.dims(), [1, 1, 11, 11]);
        // square grids stay unconstrained
        let y = model.forward(input([1, 1, 13, 7]), None).unwrap();
        assert_eq!(y.dims(), [1, 1, 13, 7]);
    }

    #[test]
    fn test_non_square_grid_is_fixed() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Convnet, 1, 0, 4, 2, [12, 16])
            .init::<TestBackend>(&device)
            .unwrap();

        assert!(model.signature().inputs[0].is_fixed());
        assert!(model.forward(input([1, 1, 12, 16]), None).is_ok());
        assert!(matches!(
            model.forward(input([1, 1, 16, 12]), None),
            Err(Dl4dsError::InvalidTensorShape { .. })
        ));
    }

    #[test]
    fn test_too_small_runtime_grid_is_rejected() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Convnet, 1, 0, 4, 3, [32, 32])
            .init::<TestBackend>(&device)
            .unwrap();

        assert!(matches!(
            model.forward(input([1, 1, 5, 5]), None),
            Err(Dl4dsError::InvalidTensorShape { .. })
        ));
    }

    #[test]
    fn test_localcon_and_aux_input() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Resnet, 1, 2, 4, 2, [8, 8])
            .with_localcon_layer(true)
            .with_dropout_variant(DropoutVariant::McSpatial)
            .init::<TestBackend>(&device)
            .unwrap();

        assert_eq!(model.signature().inputs.len(), 2);
        let y = model
            .forward(input([1, 1, 8, 8]), Some(input([1, 2, 8, 8])))
            .unwrap();
        assert_eq!(y.dims(), [1, 1, 8, 8]);

        assert!(model
            .forward(input([1, 1, 16, 16]), Some(input([1, 2, 16, 16])))
            .is_err());
    }

    #[test]
    fn test_zero_depth_runs_the_bottleneck_only() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Convnet, 1, 0, 4, 2, [3, 3])
            .init::<TestBackend>(&device)
            .unwrap();

        assert_eq!(model.depth(), 0);
        assert!(model.encoder_filters().is_empty());
        let y = model.forward(input([1, 1, 3, 3]), None).unwrap();
        assert_eq!(y.dims(), [1, 1, 3, 3]);
    }

    #[test]
    fn test_skip_shape_plan() {
        assert!(check_skip_shapes([11, 8], 2).is_ok());
        assert!(check_skip_shapes([256, 255], 7).is_ok());
        for grid in [[2, 2], [3, 17], [11, 11], [64, 37], [255, 256]] {
            let depth = check_n_blocks(grid, 10);
            assert!(check_skip_shapes(grid, depth).is_ok(), "{grid:?}");
        }
        assert!(matches!(
            check_skip_shapes([3, 8], 2),
            Err(Dl4dsError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_bottleneck_is_never_normalized() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Convnet, 1, 0, 4, 2, [16, 16])
            .with_normalization(Some(NormalizationType::Batch))
            .with_attention(true)
            .init::<TestBackend>(&device)
            .unwrap();

        assert!(!model.bottleneck.has_normalization());
        assert!(model.bottleneck.has_attention());
        assert!(model
            .decoders
            .iter()
            .all(|stage| stage.block.has_normalization()));
    }

    #[test]
    fn test_model_name_follows_backbone() {
        let device = Default::default();
        let model = UnetPinConfig::new(Backbone::Densenet, 1, 0, 4, 1, [8, 8])
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(model.name(), "densenet_pin");
    }
}
