mod descriptor;
mod handle;
mod metadata;

pub use crate::types::descriptor::{NumberKind, PrimitiveKind, Shape, TimestampKind, TypeDescriptor};
pub use crate::types::handle::{
    Annotation, AnnotationArg, Capability, EnumMemberHandle, HandleKind, PropertyHandle,
    SYSTEM_NAMESPACE, TypeHandle, load_type_graph,
};
pub use crate::types::metadata::{
    DEFAULT_DOMAIN_ANNOTATION, DESCRIPTION_ANNOTATION, FLAGS_ANNOTATION, Metadata,
    OBSOLETE_ANNOTATION, Obsolete, REQUIRED_ANNOTATION,
};
