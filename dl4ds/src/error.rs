use thiserror::Error;

/// The error type for `dl4ds-burn` operations.
///
/// Covers argument normalization, configuration validation, and the shape
/// contracts checked while assembling or invoking a network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Dl4dsError {
    /// A categorical argument is not one of its accepted values.
    #[error("`{argument}` not recognized: {value:?}. Must be one of: {}", .allowed.join(", "))]
    InvalidArgument {
        /// The argument name.
        argument: &'static str,
        /// The rejected value.
        value: String,
        /// The canonical accepted values.
        allowed: Vec<&'static str>,
    },

    /// Error for when an invalid model configuration is provided.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when a model is invoked with the wrong set of inputs.
    #[error("Invalid model input: {reason}")]
    InvalidInput {
        /// What was wrong with the inputs.
        reason: String,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid shape for `{tensor}`: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The name of the offending tensor.
        tensor: String,
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// Two tensors cannot be reconciled for a merge.
    #[error("Shape mismatch in {operation}: {reason}")]
    ShapeMismatch {
        /// The merge that failed.
        operation: String,
        /// Why the shapes cannot be reconciled.
        reason: String,
    },
}

/// A specialized `Result` type for `dl4ds-burn` operations.
pub type Dl4dsResult<T> = Result<T, Dl4dsError>;
