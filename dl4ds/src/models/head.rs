//! # Output Head
//!
//! The tail shared by both networks: optional localized convolution, optional
//! auxiliary branch, then a penultimate block (no activation, attention on) and
//! the output block.

use burn::prelude::*;

use super::modules::{ConvBlock, ConvBlockConfig, LocalizedConv2d, LocalizedConv2dConfig};
use crate::config::{ActivationType, DropoutVariant, NormalizationType};
use crate::error::{Dl4dsError, Dl4dsResult};

/// Channels produced by the localized convolution.
pub const LOCALCON_FILTERS: usize = 2;

#[derive(Config, Debug)]
pub struct PinHeadConfig {
    /// Channels of the trunk (or decoder) output.
    pub in_channels: usize,
    /// Width of the auxiliary branch and the penultimate block.
    pub n_filters: usize,
    pub activation: ActivationType,
    pub dropout_rate: f64,
    /// `0` disables the auxiliary branch.
    #[config(default = 0)]
    pub n_aux_channels: usize,
    #[config(default = 1)]
    pub n_channels_out: usize,
    #[config(default = "None")]
    pub normalization: Option<NormalizationType>,
    #[config(default = "None")]
    pub output_activation: Option<ActivationType>,
    /// Grid of the localized convolution; `None` disables it.
    #[config(default = "None")]
    pub localcon_grid: Option<[usize; 2]>,
}

impl PinHeadConfig {
    /// Channels entering the penultimate block.
    #[must_use]
    pub const fn merged_channels(&self) -> usize {
        let mut channels = self.in_channels;
        if self.localcon_grid.is_some() {
            channels += LOCALCON_FILTERS;
        }
        if self.n_aux_channels > 0 {
            channels += self.n_filters;
        }
        channels
    }

    pub fn init<B: Backend>(&self, device: &Device<B>) -> PinHead<B> {
        let localcon = self.localcon_grid.map(|[height, width]| {
            LocalizedConv2dConfig::new(self.in_channels, LOCALCON_FILTERS, height, width)
                .init(device)
        });

        let aux = (self.n_aux_channels > 0).then(|| {
            ConvBlockConfig::new(self.n_aux_channels, self.n_filters)
                .with_activation(Some(self.activation))
                .with_normalization(self.normalization)
                .init(device)
        });

        let penultimate = ConvBlockConfig::new(self.merged_channels(), self.n_filters)
            .with_activation(None)
            .with_dropout_rate(self.dropout_rate)
            .with_dropout_variant(DropoutVariant::Bernoulli)
            .with_normalization(self.normalization)
            .with_attention(true)
            .init(device);

        let output = ConvBlockConfig::new(self.n_filters, self.n_channels_out)
            .with_activation(self.output_activation)
            .with_normalization(self.normalization)
            .init(device);

        PinHead {
            localcon,
            aux,
            penultimate,
            output,
        }
    }
}

#[derive(Module, Debug)]
pub struct PinHead<B: Backend> {
    localcon: Option<LocalizedConv2d<B>>,
    aux: Option<ConvBlock<B>>,
    penultimate: ConvBlock<B>,
    output: ConvBlock<B>,
}

impl<B: Backend> PinHead<B> {
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidInput)` if `aux` is supplied without an
    /// auxiliary branch or vice versa, and propagates localized convolution
    /// shape errors.
    pub fn forward(
        &self,
        x: Tensor<B, 4>,
        aux: Option<Tensor<B, 4>>,
    ) -> Dl4dsResult<Tensor<B, 4>> {
        let x = match &self.localcon {
            Some(localcon) => {
                let weights = localcon.forward(x.clone())?;
                Tensor::cat(vec![x, weights], 1)
            }
            None => x,
        };

        let x = match (&self.aux, aux) {
            (Some(branch), Some(aux)) => Tensor::cat(vec![x, branch.forward(aux)], 1),
            (None, None) => x,
            (branch, _) => {
                return Err(Dl4dsError::InvalidInput {
                    reason: if branch.is_some() {
                        "auxiliary input is required".to_string()
                    } else {
                        "model has no auxiliary input".to_string()
                    },
                })
            }
        };

        Ok(self.output.forward(self.penultimate.forward(x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config() -> PinHeadConfig {
        PinHeadConfig::new(8, 8, ActivationType::Relu, 0.2)
    }

    #[test]
    fn test_merged_channels() {
        assert_eq!(config().merged_channels(), 8);
        assert_eq!(config().with_n_aux_channels(3).merged_channels(), 16);
        assert_eq!(
            config()
                .with_n_aux_channels(3)
                .with_localcon_grid(Some([4, 4]))
                .merged_channels(),
            18
        );
    }

    #[test]
    fn test_head_with_every_branch() {
        let device = Default::default();
        let head = config()
            .with_n_aux_channels(3)
            .with_localcon_grid(Some([4, 6]))
            .with_n_channels_out(2)
            .init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::ones([2, 8, 4, 6], &device);
        let aux = Tensor::<TestBackend, 4>::ones([2, 3, 4, 6], &device);
        assert_eq!(head.forward(x, Some(aux)).unwrap().dims(), [2, 2, 4, 6]);
    }

    #[test]
    fn test_aux_arity_mismatch() {
        let device = Default::default();
        let head = config().with_n_aux_channels(3).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::ones([1, 8, 4, 4], &device);

        assert!(matches!(
            head.forward(x, None),
            Err(Dl4dsError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_attention_only_on_penultimate_block() {
        let device = Default::default();
        let head = config()
            .with_n_aux_channels(3)
            .with_normalization(Some(NormalizationType::Batch))
            .init::<TestBackend>(&device);

        assert!(head.penultimate.has_attention());
        assert!(!head.output.has_attention());
        let aux = head.aux.as_ref().expect("auxiliary branch");
        assert!(!aux.has_attention());

        assert!(head.penultimate.has_normalization());
        assert!(head.output.has_normalization());
        assert!(aux.has_normalization());
    }
}
