//! Error types for thickness analysis.

use thiserror::Error;

/// Result type alias for thickness operations.
pub type ThicknessResult<T> = Result<T, ThicknessError>;

/// Errors that can occur during thickness analysis.
///
/// Per-vertex measurement failures are not errors; they are recorded in the
/// thickness field as [`Thickness::Unmeasured`](crate::Thickness::Unmeasured).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThicknessError {
    /// Mesh has no vertex normals and automatic estimation is disabled.
    #[error("mesh has no vertex normals and automatic normal computation is disabled")]
    MissingNormals,

    /// Invalid analysis parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A query was issued before any call to `compute`.
    #[error("thickness has not been computed yet")]
    NotComputed,
}

impl ThicknessError {
    /// Create a missing normals error.
    #[must_use]
    pub const fn missing_normals() -> Self {
        Self::MissingNormals
    }

    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }

    /// Create a not computed error.
    #[must_use]
    pub const fn not_computed() -> Self {
        Self::NotComputed
    }

    /// Whether this error was raised by the precondition stage.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingNormals | Self::InvalidParams(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ThicknessError::missing_normals();
        assert!(format!("{err}").contains("normals"));

        let err = ThicknessError::invalid_params("epsilon must be positive");
        assert!(format!("{err}").contains("epsilon must be positive"));

        let err = ThicknessError::not_computed();
        assert!(format!("{err}").contains("not been computed"));
    }

    #[test]
    fn test_configuration_classification() {
        assert!(ThicknessError::missing_normals().is_configuration());
        assert!(ThicknessError::invalid_params("x").is_configuration());
        assert!(!ThicknessError::not_computed().is_configuration());
    }
}
