//! Enumeration types for network configuration.
//!
//! Every option is a closed set. Values parse from loose strings through the
//! `checkarg_*` normalizers, and serialize to their canonical names, so a JSON
//! config with an unknown value fails to load.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::checkarg::{
    checkarg_activation, checkarg_backbone, checkarg_decoder_upsampling, checkarg_dropout_variant,
    checkarg_normalization,
};
use crate::error::Dl4dsError;

/// Implements `FromStr`, `TryFrom<String>`, `Display` and `Into<String>` for an
/// option enum on top of its `as_str` and `checkarg_*` function.
macro_rules! string_option {
    ($name:ident, $checkarg:ident) => {
        impl FromStr for $name {
            type Err = Dl4dsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $checkarg(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Dl4dsError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $checkarg(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// The repeated-block topology of the plain network trunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Backbone {
    /// Plain convolutional blocks; the trunk output replaces its input.
    Convnet,
    /// Residual blocks; the trunk output is added to its input.
    Resnet,
    /// Dense blocks with transition layers; the trunk output is concatenated to its input.
    Densenet,
}

impl Backbone {
    /// Canonical names, in declaration order.
    pub const NAMES: &'static [&'static str] = &["convnet", "resnet", "densenet"];

    /// The canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Convnet => "convnet",
            Self::Resnet => "resnet",
            Self::Densenet => "densenet",
        }
    }
}

string_option!(Backbone, checkarg_backbone);

/// The dropout layer applied wherever a block has a non-zero dropout rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DropoutVariant {
    /// Standard element-wise dropout (the `none` option).
    Bernoulli,
    /// Multiplicative Gaussian noise.
    Gaussian,
    /// Channel-wise dropout.
    Spatial,
    /// Element-wise dropout kept active at inference.
    McBernoulli,
    /// Gaussian noise kept active at inference.
    McGaussian,
    /// Channel-wise dropout kept active at inference.
    McSpatial,
}

impl DropoutVariant {
    /// Canonical names, in declaration order.
    pub const NAMES: &'static [&'static str] = &[
        "none",
        "gaussian",
        "spatial",
        "mcdrop",
        "mcgaussiandrop",
        "mcspatialdrop",
    ];

    /// The canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bernoulli => "none",
            Self::Gaussian => "gaussian",
            Self::Spatial => "spatial",
            Self::McBernoulli => "mcdrop",
            Self::McGaussian => "mcgaussiandrop",
            Self::McSpatial => "mcspatialdrop",
        }
    }

    /// Whether the layer stays active at inference time.
    #[must_use]
    pub const fn is_monte_carlo(&self) -> bool {
        matches!(self, Self::McBernoulli | Self::McGaussian | Self::McSpatial)
    }
}

string_option!(DropoutVariant, checkarg_dropout_variant);

/// How each decoder stage of the encoder-decoder network doubles its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DecoderUpsampling {
    /// Convolution followed by pixel shuffle.
    SubpixelConv,
    /// Bilinear resize followed by convolution.
    ResizeConv,
    /// Transposed convolution.
    Deconv,
}

impl DecoderUpsampling {
    /// Canonical names, in declaration order.
    pub const NAMES: &'static [&'static str] = &["spc", "rc", "dc"];

    /// The canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SubpixelConv => "spc",
            Self::ResizeConv => "rc",
            Self::Deconv => "dc",
        }
    }
}

string_option!(DecoderUpsampling, checkarg_decoder_upsampling);

/// Normalization layer used inside convolution blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NormalizationType {
    /// Batch normalization over `[batch, height, width]`.
    Batch,
    /// Layer normalization over channels.
    Layer,
}

impl NormalizationType {
    /// Canonical names, in declaration order.
    pub const NAMES: &'static [&'static str] = &["bn", "ln"];

    /// The canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Batch => "bn",
            Self::Layer => "ln",
        }
    }
}

string_option!(NormalizationType, checkarg_normalization);

/// Activation functions available to convolution blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActivationType {
    /// Rectified linear unit.
    Relu,
    /// Leaky ReLU with the `burn` default slope.
    LeakyRelu,
    /// Gaussian error linear unit.
    Gelu,
    /// Sigmoid linear unit (swish).
    Silu,
    /// Logistic sigmoid.
    Sigmoid,
    /// Hyperbolic tangent.
    Tanh,
}

impl ActivationType {
    /// Canonical names, in declaration order.
    pub const NAMES: &'static [&'static str] =
        &["relu", "leakyrelu", "gelu", "silu", "sigmoid", "tanh"];

    /// The canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Relu => "relu",
            Self::LeakyRelu => "leakyrelu",
            Self::Gelu => "gelu",
            Self::Silu => "silu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
        }
    }
}

string_option!(ActivationType, checkarg_activation);
