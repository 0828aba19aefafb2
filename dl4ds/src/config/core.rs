//! Core configuration structures for the pre-upsampling networks.
//!
//! [`NetPinConfig`] describes a full-resolution backbone network and
//! [`UnetPinConfig`] an encoder-decoder network. Both share the same
//! regularization and output-head options; the encoder-decoder adds the
//! decoder upsampling method.

use crate::error::{Dl4dsError, Dl4dsResult};
use crate::models::check_n_blocks;
use burn::prelude::*;

use super::enums::*;

/// Maximum channel count of the encoder-decoder filter schedule.
pub const MAX_FILTERS: usize = 256;

/// Configuration for the pre-upsampling backbone network (`<backbone>_pin`).
#[derive(Config, Debug)]
pub struct NetPinConfig {
    /// Trunk topology.
    pub backbone: Backbone,
    /// Channels of the primary input.
    pub n_channels: usize,
    /// Channels of the auxiliary input; `0` disables the auxiliary branch.
    pub n_aux_channels: usize,
    /// Trunk width.
    pub n_filters: usize,
    /// Number of trunk blocks.
    pub n_blocks: usize,
    /// Target high-resolution grid `[height, width]`.
    pub hr_size: [usize; 2],
    /// Output channels.
    #[config(default = 1)]
    pub n_channels_out: usize,
    /// Activation used throughout the trunk.
    #[config(default = "ActivationType::Relu")]
    pub activation: ActivationType,
    /// Dropout rate; `0.0` disables dropout.
    #[config(default = 0.2)]
    pub dropout_rate: f64,
    /// Dropout layer used wherever the rate is non-zero.
    #[config(default = "DropoutVariant::Spatial")]
    pub dropout_variant: DropoutVariant,
    /// Optional normalization inside convolution blocks.
    #[config(default = "None")]
    pub normalization: Option<NormalizationType>,
    /// Channel attention in trunk blocks.
    #[config(default = false)]
    pub attention: bool,
    /// Activation of the final block.
    #[config(default = "None")]
    pub output_activation: Option<ActivationType>,
    /// Add a localized (position-dependent) convolution before the output head.
    ///
    /// Fixes the input grid to `hr_size`.
    #[config(default = false)]
    pub localcon_layer: bool,
}

/// Configuration for the pre-upsampling encoder-decoder network.
#[derive(Config, Debug)]
pub struct UnetPinConfig {
    /// Backbone name; selects the model name only.
    pub backbone: Backbone,
    /// Channels of the primary input.
    pub n_channels: usize,
    /// Channels of the auxiliary input; `0` disables the auxiliary branch.
    pub n_aux_channels: usize,
    /// Filters of the first encoder stage.
    pub n_filters: usize,
    /// Requested encoder depth; reduced to fit `hr_size`.
    pub n_blocks: usize,
    /// Target high-resolution grid `[height, width]`.
    pub hr_size: [usize; 2],
    /// Output channels.
    #[config(default = 1)]
    pub n_channels_out: usize,
    /// Activation used throughout the network.
    #[config(default = "ActivationType::Relu")]
    pub activation: ActivationType,
    /// Dropout rate; `0.0` disables dropout.
    #[config(default = 0.2)]
    pub dropout_rate: f64,
    /// Dropout layer used wherever the rate is non-zero.
    #[config(default = "DropoutVariant::Spatial")]
    pub dropout_variant: DropoutVariant,
    /// Optional normalization inside convolution blocks (never at the bottleneck).
    #[config(default = "None")]
    pub normalization: Option<NormalizationType>,
    /// Channel attention in encoder, bottleneck and decoder blocks.
    #[config(default = false)]
    pub attention: bool,
    /// How decoder stages upsample.
    #[config(default = "DecoderUpsampling::ResizeConv")]
    pub decoder_upsampling: DecoderUpsampling,
    /// Activation of the final block.
    #[config(default = "None")]
    pub output_activation: Option<ActivationType>,
    /// Add a localized (position-dependent) convolution before the output head.
    #[config(default = false)]
    pub localcon_layer: bool,
}

/// Checks the numeric options both builders share.
fn validate_common(
    n_channels: usize,
    n_filters: usize,
    n_channels_out: usize,
    hr_size: [usize; 2],
    dropout_rate: f64,
) -> Dl4dsResult<()> {
    let checks = [
        (n_channels == 0, "n_channels must be > 0".to_string()),
        (n_filters == 0, "n_filters must be > 0".to_string()),
        (n_channels_out == 0, "n_channels_out must be > 0".to_string()),
        (
            hr_size.contains(&0),
            format!("hr_size dimensions must be > 0, got {hr_size:?}"),
        ),
        (
            !(0.0..1.0).contains(&dropout_rate),
            format!("dropout_rate must be in [0, 1), got {dropout_rate}"),
        ),
    ];

    match checks.into_iter().find(|(failed, _)| *failed) {
        Some((_, reason)) => Err(Dl4dsError::InvalidConfiguration { reason }),
        None => Ok(()),
    }
}

impl NetPinConfig {
    /// Validate the configuration before any layer is created.
    ///
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidConfiguration)` if any value is out of range.
    pub fn validate(&self) -> Dl4dsResult<()> {
        validate_common(
            self.n_channels,
            self.n_filters,
            self.n_channels_out,
            self.hr_size,
            self.dropout_rate,
        )?;

        if self.backbone == Backbone::Densenet && self.n_filters < 2 {
            return Err(Dl4dsError::InvalidConfiguration {
                reason: format!(
                    "densenet transition blocks need n_filters >= 2, got {}",
                    self.n_filters
                ),
            });
        }

        Ok(())
    }

    /// Whether the inputs are fixed to `hr_size`.
    #[must_use]
    pub const fn fixed_grid(&self) -> bool {
        self.localcon_layer
    }

    /// The model name, `<backbone>_pin`.
    #[must_use]
    pub fn model_name(&self) -> String {
        format!("{}_pin", self.backbone)
    }
}

impl UnetPinConfig {
    /// Validate the configuration before any layer is created.
    ///
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidConfiguration)` if any value is out of range.
    pub fn validate(&self) -> Dl4dsResult<()> {
        validate_common(
            self.n_channels,
            self.n_filters,
            self.n_channels_out,
            self.hr_size,
            self.dropout_rate,
        )
    }

    /// Whether the inputs are fixed to `hr_size`.
    ///
    /// Unlike [`NetPinConfig::fixed_grid`], a non-square grid is also fixed.
    #[must_use]
    pub const fn fixed_grid(&self) -> bool {
        self.localcon_layer || self.hr_size[0] != self.hr_size[1]
    }

    /// The model name, `<backbone>_pin`.
    #[must_use]
    pub fn model_name(&self) -> String {
        format!("{}_pin", self.backbone)
    }

    /// The encoder depth after fitting `n_blocks` to `hr_size`.
    #[must_use]
    pub fn effective_depth(&self) -> usize {
        check_n_blocks(self.hr_size, self.n_blocks)
    }

    /// Filter count of each encoder stage: starts at `n_filters`, doubles per stage,
    /// capped at [`MAX_FILTERS`].
    ///
    /// Decoder stages use the same counts in reverse.
    #[must_use]
    pub fn filter_schedule(&self) -> Vec<usize> {
        filter_schedule(self.n_filters, self.effective_depth())
    }
}

/// Filter counts of `depth` encoder stages starting at `n_filters`.
#[must_use]
pub fn filter_schedule(n_filters: usize, depth: usize) -> Vec<usize> {
    core::iter::successors(Some(n_filters), |&filters| {
        Some(MAX_FILTERS.min(filters.saturating_mul(2)))
    })
    .take(depth)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_schedule_caps_at_256() {
        assert_eq!(filter_schedule(32, 4), vec![32, 64, 128, 256]);
        assert_eq!(filter_schedule(100, 4), vec![100, 200, 256, 256]);
        assert!(filter_schedule(32, 0).is_empty());
    }

    #[test]
    fn test_decoder_schedule_mirrors_encoder() {
        let config = UnetPinConfig::new(Backbone::Resnet, 1, 0, 32, 4, [128, 128]);
        let encoder = config.filter_schedule();
        let decoder: Vec<usize> = encoder.iter().rev().copied().collect();

        assert_eq!(encoder, vec![32, 64, 128, 256]);
        assert_eq!(decoder, vec![256, 128, 64, 32]);
        assert_eq!(decoder[0], *encoder.last().unwrap());
    }

    #[test]
    fn test_effective_depth_reduces() {
        let config = UnetPinConfig::new(Backbone::Convnet, 1, 0, 8, 6, [64, 64]);
        assert_eq!(config.effective_depth(), 5);
        assert_eq!(config.filter_schedule().len(), 5);
    }

    #[test]
    fn test_grid_policies_differ() {
        let net = NetPinConfig::new(Backbone::Convnet, 1, 0, 8, 2, [32, 48]);
        let unet = UnetPinConfig::new(Backbone::Convnet, 1, 0, 8, 2, [32, 48]);
        assert!(!net.fixed_grid());
        assert!(unet.fixed_grid());

        let square = UnetPinConfig::new(Backbone::Convnet, 1, 0, 8, 2, [32, 32]);
        assert!(!square.fixed_grid());
        assert!(square.with_localcon_layer(true).fixed_grid());
    }

    #[test]
    fn test_defaults() {
        let config = NetPinConfig::new(Backbone::Resnet, 3, 0, 16, 4, [64, 64]);
        assert_eq!(config.n_channels_out, 1);
        assert_eq!(config.activation, ActivationType::Relu);
        assert_eq!(config.dropout_rate, 0.2);
        assert_eq!(config.dropout_variant, DropoutVariant::Spatial);
        assert_eq!(config.normalization, None);
        assert!(!config.attention);
        assert_eq!(config.output_activation, None);
        assert!(!config.localcon_layer);
        assert_eq!(config.model_name(), "resnet_pin");

        let unet = UnetPinConfig::new(Backbone::Resnet, 3, 0, 16, 4, [64, 64]);
        assert_eq!(unet.decoder_upsampling, DecoderUpsampling::ResizeConv);
    }
}
