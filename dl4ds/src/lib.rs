//! # dl4ds-burn
//!
//! Pre-upsampling super-resolution networks for gridded data, built with Burn.
//!
//! The low-resolution field is resampled to the target grid beforehand; the
//! networks here refine it at that resolution. Two builders are provided:
//!
//! - [`NetPinConfig`] assembles a [`NetPin`]: a trunk of convolutional, residual
//!   or dense blocks at full resolution.
//! - [`UnetPinConfig`] assembles a [`UnetPin`]: an encoder-decoder whose depth is
//!   fitted to the target grid by [`check_n_blocks`].
//!
//! Both accept an optional auxiliary input, an optional localized convolution and
//! share the same output head.
//!
//! ```no_run
//! use burn::backend::NdArray;
//! use dl4ds_burn::{Backbone, NetPinConfig};
//!
//! let device = Default::default();
//! let model = NetPinConfig::new(Backbone::Resnet, 1, 0, 32, 4, [64, 64])
//!     .init::<NdArray>(&device)?;
//! assert_eq!(model.name(), "resnet_pin");
//! # Ok::<(), dl4ds_burn::Dl4dsError>(())
//! ```

pub mod config;
pub mod error;
pub mod models;


pub use config::{
    checkarg_activation, checkarg_backbone, checkarg_decoder_upsampling, checkarg_dropout_variant,
    checkarg_normalization, filter_schedule, ActivationType, Backbone, DecoderUpsampling,
    DropoutVariant, NetPinConfig, NormalizationType, UnetPinConfig, MAX_FILTERS,
};
pub use error::{Dl4dsError, Dl4dsResult};
pub use models::{check_n_blocks, ModelSignature, NetPin, TensorSpec, UnetPin};
