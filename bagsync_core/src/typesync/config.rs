use crate::types::DEFAULT_DOMAIN_ANNOTATION;
use serde::{Deserialize, Serialize};

/// Namespace roots and reserved names the classifier keys off.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Enumerations under this namespace are importable without a domain tag
    pub enumerations_root: String,
    /// Transfer types under this namespace are view-model references
    pub view_model_root: String,
    /// Name suffixes that mark a view-model type (e.g. "Bag", "Box")
    pub view_model_suffixes: Vec<String>,
    /// Simple name of the validity-tracking generic box
    pub box_type_name: String,
    /// Annotation carrying the domain of an enumeration outside the root
    pub domain_annotation: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enumerations_root: "App.Enumerations".to_string(),
            view_model_root: "App.ViewModels".to_string(),
            view_model_suffixes: vec!["Bag".to_string(), "Box".to_string()],
            box_type_name: "Validated".to_string(),
            domain_annotation: DEFAULT_DOMAIN_ANNOTATION.to_string(),
        }
    }
}

/// Module paths used by browser-runtime declarations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Module exporting the `Identifier` helper type
    pub identifier_import: String,
    /// Module exporting `ReferenceDescriptor`
    pub reference_import: String,
    /// Module exporting the validity-tracking box
    pub box_import: String,
    /// Root module of global enumerations; the namespace path is appended
    pub enumerations_import_root: String,
    /// Root module of generated view-models; the namespace path is appended
    pub view_models_import_root: String,
    /// Module of domain-tagged enumerations; `{domain}` is replaced by the domain folder
    pub domain_enumerations_import: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            identifier_import: "@/shared/identifier".to_string(),
            reference_import: "@/shared/reference".to_string(),
            box_import: "@/shared/validated".to_string(),
            enumerations_import_root: "@/enumerations".to_string(),
            view_models_import_root: "@/viewModels".to_string(),
            domain_enumerations_import: "@/domains/{domain}/enumerations".to_string(),
        }
    }
}

/// Namespaces used by managed-runtime bag classes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagedConfig {
    /// Namespace declaring `ReferenceDescriptor`
    pub reference_namespace: String,
    /// Namespace declaring the identifier type
    pub identifier_namespace: String,
    /// Namespace declaring the validity-tracking box
    pub box_namespace: String,
    /// Suffix appended to an entity name to form its bag class
    pub bag_suffix: String,
}

impl Default for ManagedConfig {
    fn default() -> Self {
        Self {
            reference_namespace: "App.Shared.References".to_string(),
            identifier_namespace: "System".to_string(),
            box_namespace: "App.Shared.Validation".to_string(),
            bag_suffix: "Bag".to_string(),
        }
    }
}

/// How a batch reacts to a type it cannot classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Fail the batch with the offending type's name
    Strict,
    /// Emit a placeholder and a diagnostic, then continue
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub strictness: Strictness,
    /// Deepest generic/array nesting the classifier will follow
    pub max_type_depth: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            max_type_depth: 32,
        }
    }
}
