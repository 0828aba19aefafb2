//! # Model Signature
//!
//! Named inputs and output of an assembled network, checked before every forward
//! pass.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Dl4dsError, Dl4dsResult};

/// Name of the primary input.
pub const INPUT_NAME: &str = "input";
/// Name of the auxiliary input.
pub const AUX_INPUT_NAME: &str = "aux_input";
/// Name of the output.
pub const OUTPUT_NAME: &str = "output";

/// A named `[batch, channels, height, width]` tensor. `None` spatial dimensions
/// accept any size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name: String,
    pub channels: usize,
    pub height: Option<usize>,
    pub width: Option<usize>,
}

impl TensorSpec {
    /// A spec fixed to `grid` when `fixed` is set, unconstrained otherwise.
    pub fn new(name: impl Into<String>, channels: usize, grid: [usize; 2], fixed: bool) -> Self {
        let [height, width] = grid;
        Self {
            name: name.into(),
            channels,
            height: fixed.then_some(height),
            width: fixed.then_some(width),
        }
    }

    /// Whether the spatial dimensions are fixed.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.height.is_some() || self.width.is_some()
    }

    /// Checks `dims` against the channel count and any fixed dimension.
    ///
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidTensorShape)` on a mismatch.
    pub fn check(&self, dims: [usize; 4]) -> Dl4dsResult<()> {
        let [_, channels, height, width] = dims;
        let fits = |expected: Option<usize>, actual: usize| expected.is_none_or(|e| e == actual);

        if channels == self.channels && fits(self.height, height) && fits(self.width, width) {
            Ok(())
        } else {
            Err(Dl4dsError::InvalidTensorShape {
                tensor: self.name.clone(),
                expected: self.to_string(),
                actual: format!("{dims:?}"),
            })
        }
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dim = |d: Option<usize>| d.map_or_else(|| "_".to_string(), |d| d.to_string());
        let (height, width) = (dim(self.height), dim(self.width));
        write!(f, "[_, {}, {height}, {width}]", self.channels)
    }
}

/// The inputs and output of an assembled network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSignature {
    pub name: String,
    /// `[input]` or `[input, aux_input]`.
    pub inputs: Vec<TensorSpec>,
    pub output: TensorSpec,
}

impl ModelSignature {
    /// Builds the signature shared by both networks.
    pub fn new(
        name: impl Into<String>,
        n_channels: usize,
        n_aux_channels: usize,
        n_channels_out: usize,
        grid: [usize; 2],
        fixed: bool,
    ) -> Self {
        let mut inputs = vec![TensorSpec::new(INPUT_NAME, n_channels, grid, fixed)];
        if n_aux_channels > 0 {
            inputs.push(TensorSpec::new(AUX_INPUT_NAME, n_aux_channels, grid, fixed));
        }

        Self {
            name: name.into(),
            inputs,
            output: TensorSpec::new(OUTPUT_NAME, n_channels_out, grid, fixed),
        }
    }

    pub fn has_aux_input(&self) -> bool {
        self.inputs.len() > 1
    }

    /// Checks the call arity and every supplied tensor against its spec.
    ///
    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidInput)` if the auxiliary input is missing or
    /// unexpected, and `Err(Dl4dsError::InvalidTensorShape)` if a shape does not
    /// match. Both inputs must also share a grid.
    pub fn check(&self, input: [usize; 4], aux: Option<[usize; 4]>) -> Dl4dsResult<()> {
        let supplied = 1 + usize::from(aux.is_some());
        let expected = self.inputs.len();
        if supplied != expected {
            let name = &self.name;
            return Err(Dl4dsError::InvalidInput {
                reason: format!("model `{name}` takes {expected} input(s), got {supplied}"),
            });
        }

        self.inputs[0].check(input)?;
        if let (Some(aux), Some(spec)) = (aux, self.inputs.get(1)) {
            spec.check(aux)?;
            if (aux[0], aux[2], aux[3]) != (input[0], input[2], input[3]) {
                return Err(Dl4dsError::InvalidTensorShape {
                    tensor: spec.name.clone(),
                    expected: format!("{:?}", [input[0], spec.channels, input[2], input[3]]),
                    actual: format!("{aux:?}"),
                });
            }
        }

        Ok(())
    }
}
