//! # Model Architectures
//!
//! The two pre-upsampling networks and their building blocks:
//!
//! - `net_pin`: a full-resolution trunk of convolutional, residual or dense blocks.
//! - `unet_pin`: an encoder-decoder with skip connections.
//! - `head`: the output head both networks end with.
//! - `depth`: fits the encoder-decoder depth to the target grid.
//! - `signature`: named inputs and output, checked before every forward pass.
//! - `modules`: convolution, attention, dropout, upsampling and localized
//!   convolution blocks.

pub mod depth;
pub mod head;
pub mod modules;
pub mod net_pin;
pub mod signature;
pub mod unet_pin;

pub use depth::{check_n_blocks, grid_plan};
pub use head::{PinHead, PinHeadConfig};
pub use net_pin::{BackboneBlock, DenseStage, NetPin};
pub use signature::{ModelSignature, TensorSpec, AUX_INPUT_NAME, INPUT_NAME, OUTPUT_NAME};
pub use unet_pin::{DecoderStage, UnetPin};
