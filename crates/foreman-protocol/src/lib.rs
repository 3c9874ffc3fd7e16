//! Boundary types shared between the configuration core and its callers.

use serde::{Deserialize, Serialize};

/// Caller capability tier, resolved by the surrounding daemon before a
/// request reaches the core.
///
/// Levels are ordered: `None < Read < Admin`. The level is supplied per
/// request and never persisted; the core trusts it as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No access.
    #[default]
    None,
    /// Read-only access; sensitive values are redacted on render.
    Read,
    /// Full access, including sensitive values.
    Admin,
}

impl AccessLevel {
    /// Whether rendered output for this caller may carry environment values.
    pub fn reveals_secrets(self) -> bool {
        self == Self::Admin
    }
}

/// Mutating operations a caller can request against the layer stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerAction {
    /// Append a new layer to the stack.
    Add,
    /// Merge new content into an existing layer's own definition.
    Combine,
}

/// Serialization formats accepted for layer content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerFormat {
    /// YAML documents, the daemon's native layer format.
    Yaml,
}

impl LayerFormat {
    /// Parse a request-supplied format name; `None` for unsupported values.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Inbound operation descriptor consumed by the plan manager.
///
/// The `format` field is kept as the raw request string so the core can
/// echo unsupported values back in its diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerRequest {
    /// Requested operation.
    pub action: LayerAction,
    /// Target layer label.
    pub label: String,
    /// Raw layer content in the named format.
    pub layer: String,
    /// Serialization format of `layer`.
    #[serde(default)]
    pub format: String,
}

#[cfg(test)]
mod tests {
    use super::{AccessLevel, LayerAction, LayerFormat, LayerRequest};
    use pretty_assertions::assert_eq;

    #[test]
    fn access_levels_are_ordered() {
        assert!(AccessLevel::None < AccessLevel::Read);
        assert!(AccessLevel::Read < AccessLevel::Admin);
        assert!(!AccessLevel::None.reveals_secrets());
        assert!(!AccessLevel::Read.reveals_secrets());
        assert!(AccessLevel::Admin.reveals_secrets());
    }

    #[test]
    fn layer_request_decodes_from_json() {
        let body = r#"{"action": "add", "label": "foo", "format": "yaml", "layer": "services: {}"}"#;
        let request: LayerRequest = serde_json::from_str(body).expect("request");
        assert_eq!(request.action, LayerAction::Add);
        assert_eq!(request.label, "foo");
        assert_eq!(request.format, "yaml");
    }

    #[test]
    fn format_field_defaults_to_empty() {
        let body = r#"{"action": "combine", "label": "base", "layer": ""}"#;
        let request: LayerRequest = serde_json::from_str(body).expect("request");
        assert_eq!(request.format, "");
        assert_eq!(LayerFormat::parse(&request.format), None);
    }

    #[test]
    fn only_yaml_format_is_supported() {
        assert_eq!(LayerFormat::parse("yaml"), Some(LayerFormat::Yaml));
        assert_eq!(LayerFormat::parse("xml"), None);
        assert_eq!(LayerFormat::parse("YAML"), None);
    }
}
