//! Argument normalization for categorical options.
//!
//! Each `checkarg_*` function maps a loosely spelled option (any case, surrounding
//! whitespace, `-`/`_` separators) to its canonical enum value, or fails with
//! [`Dl4dsError::InvalidArgument`] listing the accepted values.

use super::enums::{ActivationType, Backbone, DecoderUpsampling, DropoutVariant, NormalizationType};
use crate::error::{Dl4dsError, Dl4dsResult};

/// Lower-cases `value` and strips whitespace, `-` and `_`.
fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn invalid<T>(argument: &'static str, value: &str, allowed: &[&'static str]) -> Dl4dsResult<T> {
    Err(Dl4dsError::InvalidArgument {
        argument,
        value: value.to_string(),
        allowed: allowed.to_vec(),
    })
}

/// Normalizes a backbone name.
///
/// # Errors
///
/// Returns `Err(Dl4dsError::InvalidArgument)` for unknown backbones.
pub fn checkarg_backbone(value: &str) -> Dl4dsResult<Backbone> {
    match normalize(value).as_str() {
        "convnet" | "conv" | "plain" => Ok(Backbone::Convnet),
        "resnet" | "residual" => Ok(Backbone::Resnet),
        "densenet" | "dense" => Ok(Backbone::Densenet),
        _ => invalid("backbone", value, Backbone::NAMES),
    }
}

/// Normalizes a dropout variant name.
///
/// `"none"` selects standard (Bernoulli) dropout; whether dropout is applied at all
/// is controlled by the dropout rate.
///
/// # Errors
///
/// Returns `Err(Dl4dsError::InvalidArgument)` for unknown variants.
pub fn checkarg_dropout_variant(value: &str) -> Dl4dsResult<DropoutVariant> {
    match normalize(value).as_str() {
        "none" | "bernoulli" | "dropout" => Ok(DropoutVariant::Bernoulli),
        "gaussian" | "gaussiandrop" => Ok(DropoutVariant::Gaussian),
        "spatial" | "spatialdrop" => Ok(DropoutVariant::Spatial),
        "mcdrop" | "mcbernoulli" | "mcdropout" => Ok(DropoutVariant::McBernoulli),
        "mcgaussiandrop" | "mcgaussian" => Ok(DropoutVariant::McGaussian),
        "mcspatialdrop" | "mcspatial" => Ok(DropoutVariant::McSpatial),
        _ => invalid("dropout_variant", value, DropoutVariant::NAMES),
    }
}

/// Normalizes a decoder upsampling method.
///
/// # Errors
///
/// Returns `Err(Dl4dsError::InvalidArgument)` for unknown methods.
pub fn checkarg_decoder_upsampling(value: &str) -> Dl4dsResult<DecoderUpsampling> {
    match normalize(value).as_str() {
        "spc" | "subpixel" | "subpixelconv" => Ok(DecoderUpsampling::SubpixelConv),
        "rc" | "resizeconv" | "bilinear" => Ok(DecoderUpsampling::ResizeConv),
        "dc" | "deconv" | "transposed" | "transposedconv" => Ok(DecoderUpsampling::Deconv),
        _ => invalid("decoder_upsampling", value, DecoderUpsampling::NAMES),
    }
}

/// Normalizes a normalization layer name.
///
/// # Errors
///
/// Returns `Err(Dl4dsError::InvalidArgument)` for unknown normalizations.
pub fn checkarg_normalization(value: &str) -> Dl4dsResult<NormalizationType> {
    match normalize(value).as_str() {
        "bn" | "batch" | "batchnorm" => Ok(NormalizationType::Batch),
        "ln" | "layer" | "layernorm" => Ok(NormalizationType::Layer),
        _ => invalid("normalization", value, NormalizationType::NAMES),
    }
}

/// Normalizes an activation name.
///
/// # Errors
///
/// Returns `Err(Dl4dsError::InvalidArgument)` for unknown activations.
pub fn checkarg_activation(value: &str) -> Dl4dsResult<ActivationType> {
    match normalize(value).as_str() {
        "relu" => Ok(ActivationType::Relu),
        "leakyrelu" => Ok(ActivationType::LeakyRelu),
        "gelu" => Ok(ActivationType::Gelu),
        "silu" | "swish" => Ok(ActivationType::Silu),
        "sigmoid" => Ok(ActivationType::Sigmoid),
        "tanh" => Ok(ActivationType::Tanh),
        _ => invalid("activation", value, ActivationType::NAMES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backbone_loose_spelling() {
        assert_eq!(checkarg_backbone("resnet").unwrap(), Backbone::Resnet);
        assert_eq!(checkarg_backbone("  ResNet ").unwrap(), Backbone::Resnet);
        assert_eq!(checkarg_backbone("DENSE").unwrap(), Backbone::Densenet);
        assert_eq!(checkarg_backbone("conv_net").unwrap(), Backbone::Convnet);
    }

    #[test]
    fn test_backbone_rejects_unknown() {
        let first = checkarg_backbone("transformer").unwrap_err();
        let second = checkarg_backbone("transformer").unwrap_err();
        assert_eq!(first, second);

        match first {
            Dl4dsError::InvalidArgument {
                argument,
                value,
                allowed,
            } => {
                assert_eq!(argument, "backbone");
                assert_eq!(value, "transformer");
                assert_eq!(allowed, vec!["convnet", "resnet", "densenet"]);
            }
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_lists_values() {
        let message = checkarg_dropout_variant("bayesian")
            .unwrap_err()
            .to_string();
        for name in DropoutVariant::NAMES {
            assert!(message.contains(name), "{message} should mention {name}");
        }
    }

    #[test]
    fn test_dropout_variants() {
        assert_eq!(
            checkarg_dropout_variant("none").unwrap(),
            DropoutVariant::Bernoulli
        );
        assert_eq!(
            checkarg_dropout_variant("mcspatialdrop").unwrap(),
            DropoutVariant::McSpatial
        );
        assert_eq!(
            checkarg_dropout_variant("MC-Gaussian").unwrap(),
            DropoutVariant::McGaussian
        );
    }

    #[test]
    fn test_decoder_upsampling() {
        assert_eq!(
            checkarg_decoder_upsampling("rc").unwrap(),
            DecoderUpsampling::ResizeConv
        );
        assert_eq!(
            checkarg_decoder_upsampling("SPC").unwrap(),
            DecoderUpsampling::SubpixelConv
        );
        assert!(checkarg_decoder_upsampling("nearest").is_err());
    }

    #[test]
    fn test_normalization_and_activation() {
        assert_eq!(
            checkarg_normalization("bn").unwrap(),
            NormalizationType::Batch
        );
        assert_eq!(checkarg_activation("Swish").unwrap(), ActivationType::Silu);
        assert!(checkarg_activation("softmax").is_err());
    }
}
