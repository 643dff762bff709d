//! Input model: a reflected type as handed over by the reflection front end.
//!
//! Handles are plain data. The classifier never looks anything up by name, so a
//! handle must carry everything it needs: generic arguments, array element,
//! capabilities, annotations and declared members.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Namespace of the managed runtime's built-in types.
pub const SYSTEM_NAMESPACE: &str = "System";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    Array,
    GenericParameter,
}

/// Capabilities a type implements, as reported by reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Has a stable persisted identity.
    PersistedEntity,
    /// Ordered collection of one element type.
    OrderedCollection,
    /// Key/value lookup.
    KeyedCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationArg {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl AnnotationArg {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationArg::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One metadata annotation with its constructor arguments, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub args: Vec<AnnotationArg>,
}

impl Annotation {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: vec![AnnotationArg::Text(text.into())],
        }
    }

    /// Matches `Foo` against both `Foo` and `FooAttribute`.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
            || self
                .name
                .strip_suffix("Attribute")
                .is_some_and(|short| short == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyHandle {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeHandle,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl PropertyHandle {
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn required(self) -> Self {
        self.with_annotation(Annotation::marker("Required"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumMemberHandle {
    pub name: String,
    pub value: i64,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl EnumMemberHandle {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeHandle {
    /// Simple name without namespace or generic arity, e.g. `List`.
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub kind: HandleKind,
    #[serde(default)]
    pub generic_args: Vec<TypeHandle>,
    #[serde(default)]
    pub element: Option<Box<TypeHandle>>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub properties: Vec<PropertyHandle>,
    #[serde(default)]
    pub members: Vec<EnumMemberHandle>,
}

impl TypeHandle {
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// A built-in value type such as `Int32` or `Guid`.
    pub fn system(name: &str) -> Self {
        Self {
            kind: HandleKind::Struct,
            ..Self::named(SYSTEM_NAMESPACE, name)
        }
    }

    pub fn string() -> Self {
        Self::named(SYSTEM_NAMESPACE, "String")
    }

    pub fn nullable(inner: TypeHandle) -> Self {
        Self {
            kind: HandleKind::Struct,
            generic_args: vec![inner],
            ..Self::named(SYSTEM_NAMESPACE, "Nullable")
        }
    }

    pub fn array(element: TypeHandle) -> Self {
        Self {
            name: format!("{}[]", element.name),
            namespace: element.namespace.clone(),
            kind: HandleKind::Array,
            element: Some(Box::new(element)),
            ..Default::default()
        }
    }

    pub fn generic(
        namespace: impl Into<String>,
        name: impl Into<String>,
        args: Vec<TypeHandle>,
    ) -> Self {
        Self {
            generic_args: args,
            ..Self::named(namespace, name)
        }
    }

    pub fn list(element: TypeHandle) -> Self {
        Self::generic("System.Collections.Generic", "List", vec![element])
            .with_capability(Capability::OrderedCollection)
    }

    pub fn dictionary(key: TypeHandle, value: TypeHandle) -> Self {
        Self::generic("System.Collections.Generic", "Dictionary", vec![key, value])
            .with_capability(Capability::KeyedCollection)
    }

    pub fn generic_parameter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: HandleKind::GenericParameter,
            ..Default::default()
        }
    }

    pub fn entity(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::named(namespace, name).with_capability(Capability::PersistedEntity)
    }

    pub fn enumeration(
        namespace: impl Into<String>,
        name: impl Into<String>,
        members: Vec<EnumMemberHandle>,
    ) -> Self {
        Self {
            kind: HandleKind::Enum,
            members,
            ..Self::named(namespace, name)
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_property(mut self, property: PropertyHandle) -> Self {
        self.properties.push(property);
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_args.is_empty()
    }

    pub fn is_system(&self) -> bool {
        self.namespace.is_empty() || self.namespace == SYSTEM_NAMESPACE
    }

    /// Namespace-qualified name without generic arguments.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Fully-qualified name plus generic arguments. Two handles denote the same
    /// type exactly when their identities are equal.
    pub fn identity(&self) -> String {
        match (&self.element, self.generic_args.is_empty()) {
            (Some(element), _) => format!("{}[]", element.identity()),
            (None, true) => self.full_name(),
            (None, false) => format!(
                "{}<{}>",
                self.full_name(),
                self.generic_args
                    .iter()
                    .map(TypeHandle::identity)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Short name used in diagnostics, e.g. `List<Order>`.
    pub fn display_name(&self) -> String {
        match (&self.element, self.generic_args.is_empty()) {
            (Some(element), _) => format!("{}[]", element.display_name()),
            (None, true) => self.name.clone(),
            (None, false) => format!(
                "{}<{}>",
                self.name,
                self.generic_args
                    .iter()
                    .map(TypeHandle::display_name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyHandle> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Parses a JSON array of type handles produced by a reflection front end.
pub fn load_type_graph(json: &str) -> Result<Vec<TypeHandle>> {
    let handles: Vec<TypeHandle> = serde_json::from_str(json)?;
    tracing::debug!(type_count = handles.len(), "Loaded type graph");
    Ok(handles)
}
