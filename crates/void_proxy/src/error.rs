//! Error and diagnostic types for the component proxy
//!
//! Only [`ProxyError`] ever escapes to the caller. Everything the diff
//! checker finds is downgraded to a [`Diagnostic`]: logged, returned in the
//! update report, never raised.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Prefix carried by every diagnostic message
pub const DIAGNOSTIC_TAG: &str = "void-proxy:";

/// Result type for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors that can escape a proxy operation
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// `update` was handed something that cannot be constructed or called
    #[error("Expected a component constructor, found {found}")]
    InvalidImplementation {
        found: &'static str,
    },

    /// The host asked the wrapper for a live instance and the initializer failed
    #[error("Failed to construct an instance of '{component}': {message}")]
    ConstructionFailed {
        component: String,
        message: String,
    },
}

impl ProxyError {
    /// Create an invalid implementation error
    pub fn invalid_implementation(found: &'static str) -> Self {
        ProxyError::InvalidImplementation { found }
    }

    /// Create a construction failed error
    pub fn construction_failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        ProxyError::ConstructionFailed {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// A change that could not be hot-applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An instance field got a new initial value but live instances cannot regenerate it
    UnsupportedFieldChange {
        component: String,
        field: String,
        value: String,
    },
    /// A mount hook body changed; already-mounted instances keep the old one
    UnsupportedLifecycleChange {
        component: String,
        hook: String,
        source: String,
    },
}

impl Diagnostic {
    /// Name of the member the diagnostic is about
    pub fn member(&self) -> &str {
        match self {
            Diagnostic::UnsupportedFieldChange { field, .. } => field,
            Diagnostic::UnsupportedLifecycleChange { hook, .. } => hook,
        }
    }

    /// Name of the component the diagnostic is about
    pub fn component(&self) -> &str {
        match self {
            Diagnostic::UnsupportedFieldChange { component, .. }
            | Diagnostic::UnsupportedLifecycleChange { component, .. } => component,
        }
    }

    /// Emit the diagnostic through the logger
    pub(crate) fn emit(&self, strict: bool) {
        if strict {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedFieldChange { component, field, value } => write!(
                f,
                "{} {}: field '{}' changed to {}, unable to reproduce on live instances",
                DIAGNOSTIC_TAG, component, field, value
            ),
            Diagnostic::UnsupportedLifecycleChange { component, hook, source } => write!(
                f,
                "{} {}: lifecycle method '{}' changed to {}, unable to repeat on mounted instances",
                DIAGNOSTIC_TAG, component, hook, source
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProxyError::invalid_implementation("int");
        assert_eq!(err.to_string(), "Expected a component constructor, found int");

        let err = ProxyError::construction_failed("Widget", "missing prop");
        assert_eq!(err.to_string(), "Failed to construct an instance of 'Widget': missing prop");
    }

    #[test]
    fn test_diagnostic_format() {
        let diagnostic = Diagnostic::UnsupportedFieldChange {
            component: "Counter".into(),
            field: "step".into(),
            value: "2".into(),
        };

        let text = diagnostic.to_string();
        assert!(text.starts_with(DIAGNOSTIC_TAG));
        assert!(text.contains("Counter"));
        assert!(text.contains("'step'"));
        assert!(text.contains("2"));
        assert_eq!(diagnostic.member(), "step");
        assert_eq!(diagnostic.component(), "Counter");
    }
}
