use crate::types::metadata::Metadata;
use core::fmt;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Numeric primitives. `Display` yields the managed-runtime keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum NumberKind {
    #[strum(to_string = "byte")]
    Byte,
    #[strum(to_string = "sbyte")]
    SByte,
    #[strum(to_string = "short")]
    Int16,
    #[strum(to_string = "ushort")]
    UInt16,
    #[strum(to_string = "int")]
    Int32,
    #[strum(to_string = "uint")]
    UInt32,
    #[strum(to_string = "long")]
    Int64,
    #[strum(to_string = "ulong")]
    UInt64,
    #[strum(to_string = "float")]
    Single,
    #[strum(to_string = "double")]
    Double,
    #[strum(to_string = "decimal")]
    Decimal,
}

impl NumberKind {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            NumberKind::Byte
                | NumberKind::SByte
                | NumberKind::Int16
                | NumberKind::UInt16
                | NumberKind::Int32
                | NumberKind::UInt32
                | NumberKind::Int64
                | NumberKind::UInt64
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum TimestampKind {
    DateTime,
    DateTimeOffset,
    DateOnly,
    TimeOnly,
    TimeSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Number(NumberKind),
    String,
    Identifier,
    Timestamp(TimestampKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Primitive(PrimitiveKind),
    NullableWrapper(Box<TypeDescriptor>),
    Array(Box<TypeDescriptor>),
    Collection(Box<TypeDescriptor>),
    Dictionary(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// Named non-collection generic, e.g. the validity-tracking box.
    GenericContainer {
        name: String,
        args: Vec<TypeDescriptor>,
    },
    EnumerationGlobal {
        name: String,
        path: String,
        namespace: String,
    },
    EnumerationDomain {
        name: String,
        domain: String,
        namespace: String,
    },
    EntityReference {
        name: String,
    },
    /// Transfer type; `args` are the classified generic arguments of a
    /// closed generic reference such as `PageBox<OrderLineBag>`.
    ViewModelReference {
        name: String,
        path: String,
        namespace: String,
        args: Vec<TypeDescriptor>,
    },
    GenericParameter {
        name: String,
    },
    Unsupported {
        type_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub shape: Shape,
    /// Fully-qualified name plus generic arguments.
    pub identity: String,
    pub metadata: Metadata,
}

impl TypeDescriptor {
    pub fn new(shape: Shape, identity: impl Into<String>) -> Self {
        Self {
            shape,
            identity: identity.into(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Strips one nullable wrapper, if present.
    pub fn unwrap_nullable(&self) -> &TypeDescriptor {
        match &self.shape {
            Shape::NullableWrapper(inner) => inner,
            _ => self,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.shape, Shape::NullableWrapper(_))
    }

    pub fn is_entity_reference(&self) -> bool {
        matches!(self.shape, Shape::EntityReference { .. })
    }

    pub fn is_resolved_enumeration(&self) -> bool {
        matches!(
            self.shape,
            Shape::EnumerationGlobal { .. } | Shape::EnumerationDomain { .. }
        )
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Primitive(PrimitiveKind::Boolean) => write!(f, "Boolean"),
            Shape::Primitive(PrimitiveKind::Number(kind)) => write!(f, "Number({})", kind),
            Shape::Primitive(PrimitiveKind::String) => write!(f, "String"),
            Shape::Primitive(PrimitiveKind::Identifier) => write!(f, "Identifier"),
            Shape::Primitive(PrimitiveKind::Timestamp(kind)) => write!(f, "Timestamp({})", kind),
            Shape::NullableWrapper(inner) => write!(f, "Nullable({})", inner.shape),
            Shape::Array(element) => write!(f, "Array({})", element.shape),
            Shape::Collection(element) => write!(f, "Collection({})", element.shape),
            Shape::Dictionary(key, value) => {
                write!(f, "Dictionary({}, {})", key.shape, value.shape)
            }
            Shape::GenericContainer { name, args } => {
                write!(f, "{}(", name)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Shape::EnumerationGlobal { name, path, .. } => {
                write!(f, "EnumerationGlobal({}, {})", name, path)
            }
            Shape::EnumerationDomain { name, domain, .. } => {
                write!(f, "EnumerationDomain({}, {})", name, domain)
            }
            Shape::EntityReference { name } => write!(f, "EntityReference({})", name),
            Shape::ViewModelReference {
                name, path, args, ..
            } => {
                write!(f, "ViewModelReference({}", name)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    write_args(f, args)?;
                    write!(f, ">")?;
                }
                write!(f, ", {})", path)
            }
            Shape::GenericParameter { name } => write!(f, "GenericParameter({})", name),
            Shape::Unsupported { type_name } => write!(f, "Unsupported({})", type_name),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeDescriptor]) -> fmt::Result {
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg.shape)?;
    }
    Ok(())
}
