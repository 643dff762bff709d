// TypeSync - declarations for the browser and managed runtimes

pub mod classify;
pub mod config;
pub mod conversion;
pub mod docs;
pub mod enumeration;
pub mod generator;
pub mod imports;
pub mod mapper;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Runtime a declaration is emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetFormat {
    /// TypeScript declarations
    Browser,
    /// C# bag classes
    Managed,
}

pub use classify::{Classifier, domain_folder_name};
pub use config::{BrowserConfig, ClassifierConfig, GenerationConfig, ManagedConfig, Strictness};
pub use conversion::{ConversionStrategy, classify_conversion, is_supported_property_type};
pub use docs::{DocumentationIndex, DocumentationProvider, rewrite_documentation};
pub use enumeration::{EnumerationGenerator, generate_enumeration};
pub use generator::{BatchFailure, Diagnostic, GeneratedFile, Generator};
pub use imports::{ImportDescriptor, ImportSet};
pub use mapper::{Declaration, DeclarationMapper};
