//! Error types for the spillover analytics and layout core.
//!
//! The numeric builders never fail: sparse input degrades through defaults
//! (missing weights are 0, zero distances are floored). Errors are reserved
//! for malformed input rejected at the boundary.

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when validating input for analytics or layout.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No initial position for node {code} and no default position configured")]
    MissingPosition { code: String },

    #[error("Node index {index} out of range ({node_count} nodes)")]
    NodeOutOfRange { index: usize, node_count: usize },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::invalid("negative weight US -> CN: -0.1");
        assert_eq!(e.to_string(), "Invalid input: negative weight US -> CN: -0.1");

        let e = Error::MissingPosition {
            code: "DE".to_string(),
        };
        assert!(e.to_string().contains("DE"));

        let e = Error::NodeOutOfRange {
            index: 7,
            node_count: 3,
        };
        assert_eq!(e.to_string(), "Node index 7 out of range (3 nodes)");
    }
}
