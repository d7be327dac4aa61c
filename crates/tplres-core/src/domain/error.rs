// ============================================================================
// domain/error.rs - DOMAIN VALIDATION ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (the same rejection can be reported from several call-sites)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid template name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid source configuration: {0}")]
    InvalidSource(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidName { name, reason } => vec![
                format!("'{}' was rejected: {}", name, reason),
                "Template names are relative paths such as 'mail/welcome.ftl'".into(),
                "'..' segments and empty names are not allowed".into(),
            ],
            Self::InvalidSource(msg) => vec![
                "Check the configured template sources".into(),
                format!("Details: {}", msg),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. } => ErrorCategory::Validation,
            Self::InvalidSource(_) => ErrorCategory::Configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_validation_and_sources_are_configuration() {
        let name = DomainError::InvalidName {
            name: "../x".into(),
            reason: "'..' segments are not allowed",
        };
        assert_eq!(name.category(), ErrorCategory::Validation);
        assert!(name.suggestions()[0].contains("../x"));

        let source = DomainError::InvalidSource("'/nope' is not a directory".into());
        assert_eq!(source.category(), ErrorCategory::Configuration);
        assert!(source.suggestions().iter().any(|s| s.contains("/nope")));
    }
}
