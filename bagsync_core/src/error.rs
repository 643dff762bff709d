use thiserror::Error;

#[derive(Error, Debug)]
pub enum BagsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Unsupported type: {type_name}")]
    UnsupportedType { type_name: String },

    #[error("Unsupported property type: {type_name} (property {owner}.{property})")]
    UnsupportedProperty {
        owner: String,
        property: String,
        type_name: String,
    },

    #[error("Malformed metadata: [{annotation}] on {target}: {message}")]
    MalformedMetadata {
        annotation: String,
        target: String,
        message: String,
    },

    #[error("Maximum type nesting depth ({depth}) exceeded at {type_name}")]
    MaxTypeDepth { depth: usize, type_name: String },
}

pub type Result<T> = std::result::Result<T, BagsyncError>;

impl BagsyncError {
    pub fn config(message: impl Into<String>) -> Self {
        BagsyncError::Config(message.into())
    }

    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        BagsyncError::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    pub fn unsupported_property(
        owner: impl Into<String>,
        property: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        BagsyncError::UnsupportedProperty {
            owner: owner.into(),
            property: property.into(),
            type_name: type_name.into(),
        }
    }

    pub fn malformed_metadata(
        annotation: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        BagsyncError::MalformedMetadata {
            annotation: annotation.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// True for the failure class a lenient batch may degrade to a placeholder.
    /// Malformed metadata and depth overflows always propagate.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            BagsyncError::UnsupportedType { .. } | BagsyncError::UnsupportedProperty { .. }
        )
    }

    /// Display name of the offending type for unsupported failures.
    pub fn unsupported_type_name(&self) -> Option<&str> {
        match self {
            BagsyncError::UnsupportedType { type_name }
            | BagsyncError::UnsupportedProperty { type_name, .. } => Some(type_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_type_message_names_type() {
        let err = BagsyncError::unsupported_type("System.IntPtr");
        assert_eq!(err.to_string(), "Unsupported type: System.IntPtr");
        assert!(err.is_unsupported());
        assert_eq!(err.unsupported_type_name(), Some("System.IntPtr"));
    }

    #[test]
    fn test_malformed_metadata_is_not_degradable() {
        let err = BagsyncError::malformed_metadata("Domain", "App.Sales.Region", "missing domain");
        assert!(!err.is_unsupported());
        assert!(err.to_string().contains("[Domain] on App.Sales.Region"));
    }
}
