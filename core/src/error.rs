//! Error types for region construction and mutation.

use crate::roi::RoiId;

/// Errors raised synchronously by region, mask and slice operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoiError {
    /// A coordinate, size or axis value is out of the accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A slice-merge result cannot be stored in the stack's declared slice type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The slice type the stack declares.
        expected: &'static str,
        /// The type the operation produced.
        found: &'static str,
    },
    /// A mask would need more cells than the index space can address.
    #[error("mask allocation too large: {requested} cells requested")]
    AllocationTooLarge {
        /// Requested cell count, saturated at `u128::MAX`.
        requested: u128,
    },
    /// No region with this identifier exists in the collection.
    #[error("region {0} not found")]
    NotFound(RoiId),
}

/// Result alias used across the crate.
pub type RoiResult<T = ()> = Result<T, RoiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            RoiError::InvalidArgument("negative radius".into()).to_string(),
            "invalid argument: negative radius"
        );
        assert_eq!(
            RoiError::TypeMismatch {
                expected: "shape",
                found: "mask",
            }
            .to_string(),
            "type mismatch: expected shape, found mask"
        );
        assert_eq!(
            RoiError::AllocationTooLarge { requested: 12 }.to_string(),
            "mask allocation too large: 12 cells requested"
        );
    }
}
