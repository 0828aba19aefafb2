//! Configuration module for the pre-upsampling networks.
//!
//! - `core`: the builder configurations and their validation
//! - `enums`: the closed option sets
//! - `checkarg`: loose-string normalizers for the option sets

pub mod checkarg;
pub mod core;
pub mod enums;

pub use checkarg::{
    checkarg_activation, checkarg_backbone, checkarg_decoder_upsampling, checkarg_dropout_variant,
    checkarg_normalization,
};
pub use self::core::{filter_schedule, NetPinConfig, UnetPinConfig, MAX_FILTERS};
pub use enums::{ActivationType, Backbone, DecoderUpsampling, DropoutVariant, NormalizationType};
