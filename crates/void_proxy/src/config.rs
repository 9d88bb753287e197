//! Proxy configuration
//!
//! Controls how wrappers are named and how much diffing an update performs.
//! Parsable from TOML so reload tooling can ship it next to its own config.

use serde::Deserialize;

/// Configuration shared by every handle created from one registry
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Name given to wrappers whose implementation has no usable name
    pub fallback_name: String,
    /// Generic names that do not identify a component (treated as absent)
    pub placeholder_names: Vec<String>,
    /// Log unsupported changes as errors instead of warnings
    pub strict_diagnostics: bool,
    /// Run the instance-field diff on class updates
    pub diff_fields: bool,
    /// Run the lifecycle-hook diff on class updates
    pub diff_lifecycle: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            fallback_name: "Unknown".to_string(),
            placeholder_names: vec!["Component".to_string()],
            strict_diagnostics: false,
            diff_fields: true,
            diff_lifecycle: true,
        }
    }
}

impl ProxyConfig {
    /// Set the fallback wrapper name
    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = name.into();
        self
    }

    /// Add a placeholder name
    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder_names.push(name.into());
        self
    }

    /// Log unsupported changes at error level
    pub fn with_strict_diagnostics(mut self, strict: bool) -> Self {
        self.strict_diagnostics = strict;
        self
    }

    /// Pick the display name for an implementation.
    ///
    /// The explicit display name wins over the plain name; a missing name or
    /// a placeholder resolves to [`ProxyConfig::fallback_name`].
    pub fn resolve_display_name(&self, display_name: Option<&str>, name: Option<&str>) -> String {
        match display_name.or(name) {
            Some(candidate) if !candidate.is_empty() && !self.is_placeholder(candidate) => {
                candidate.to_string()
            }
            _ => self.fallback_name.clone(),
        }
    }

    fn is_placeholder(&self, name: &str) -> bool {
        self.placeholder_names.iter().any(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.fallback_name, "Unknown");
        assert!(config.diff_fields);
        assert!(config.diff_lifecycle);
        assert!(!config.strict_diagnostics);
    }

    #[test]
    fn test_display_name_resolution() {
        let config = ProxyConfig::default();

        assert_eq!(config.resolve_display_name(None, Some("Widget")), "Widget");
        assert_eq!(config.resolve_display_name(Some("Fancy"), Some("Widget")), "Fancy");
        assert_eq!(config.resolve_display_name(None, None), "Unknown");
        assert_eq!(config.resolve_display_name(None, Some("Component")), "Unknown");
        assert_eq!(config.resolve_display_name(None, Some("")), "Unknown");
    }

    #[test]
    fn test_config_parsing() {
        let toml = r#"
            fallback_name = "Anonymous"
            placeholder_names = ["Component", "PureComponent"]
            diff_fields = false
        "#;

        let config: ProxyConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.fallback_name, "Anonymous");
        assert!(!config.diff_fields);
        assert!(config.diff_lifecycle);
        assert_eq!(config.resolve_display_name(None, Some("PureComponent")), "Anonymous");
    }
}
