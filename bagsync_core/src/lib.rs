// Bagsync - declarations for the browser and managed runtimes from reflected types

// Common modules
pub mod config;
pub mod error;
pub mod types;
// TypeSync - classification and rendering
pub mod typesync;

// Re-export commonly used items for convenience
pub use config::BagsyncConfig;
pub use error::{BagsyncError, Result};
pub use types::{TypeDescriptor, TypeHandle, load_type_graph};
pub use typesync::{Generator, GeneratedFile, TargetFormat};
