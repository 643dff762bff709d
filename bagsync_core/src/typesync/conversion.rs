//! How each entity property travels between the entity and its bag.

use crate::error::{BagsyncError, Result};
use crate::types::{HandleKind, NumberKind, PrimitiveKind, PropertyHandle, Shape, TimestampKind, TypeDescriptor, TypeHandle};
use crate::typesync::classify::Classifier;

const ASSIGNMENT_NUMBERS: &[NumberKind] = &[
    NumberKind::Int32,
    NumberKind::Int64,
    NumberKind::Decimal,
    NumberKind::Double,
];

const ASSIGNMENT_TIMESTAMPS: &[TimestampKind] = &[TimestampKind::DateTime, TimestampKind::DateTimeOffset];

const ID_SUFFIX: &str = "Id";
const TO_REFERENCE: &str = "ToReference";
const TO_REFERENCE_LIST: &str = "ToReferenceList";
const GET_ID: &str = "GetId";
const UNWRAP_REQUIRED: &str = "Required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStrategy {
    /// Copy the member verbatim
    DirectAssignment,
    /// Entity becomes a reference descriptor. When the owner has an `<Name>Id`
    /// sibling, writing back assigns the id; a non-nullable integer sibling
    /// additionally unwraps the id as required.
    EntityToReference {
        id_property: Option<String>,
        unwrap_required: bool,
    },
    EntityCollectionToReferenceList,
    Unsupported { type_name: String },
}

impl ConversionStrategy {
    pub fn is_supported(&self) -> bool {
        !matches!(self, ConversionStrategy::Unsupported { .. })
    }

    /// Member initializer reading from `entity` inside `FromEntity`.
    pub fn render_to_bag(&self, owner: &str, property: &str) -> Result<String> {
        match self {
            ConversionStrategy::DirectAssignment => Ok(format!("{property} = entity.{property}")),
            ConversionStrategy::EntityToReference { .. } => {
                Ok(format!("{property} = entity.{property}?.{TO_REFERENCE}()"))
            }
            ConversionStrategy::EntityCollectionToReferenceList => {
                Ok(format!("{property} = entity.{property}.{TO_REFERENCE_LIST}()"))
            }
            ConversionStrategy::Unsupported { type_name } => {
                Err(BagsyncError::unsupported_property(owner, property, type_name))
            }
        }
    }

    /// Statement writing the bag value back inside `ApplyTo`. `None` when the
    /// value cannot be written back (references without an id sibling, and
    /// reference lists).
    pub fn render_from_bag(&self, owner: &str, property: &str) -> Result<Option<String>> {
        match self {
            ConversionStrategy::DirectAssignment => Ok(Some(format!("entity.{property} = {property};"))),
            ConversionStrategy::EntityToReference {
                id_property: Some(id_property),
                unwrap_required,
            } => {
                let suffix = if *unwrap_required {
                    format!(".{UNWRAP_REQUIRED}()")
                } else {
                    String::new()
                };
                Ok(Some(format!(
                    "entity.{id_property} = {property}.{GET_ID}(){suffix};"
                )))
            }
            ConversionStrategy::EntityToReference {
                id_property: None, ..
            }
            | ConversionStrategy::EntityCollectionToReferenceList => Ok(None),
            ConversionStrategy::Unsupported { type_name } => {
                Err(BagsyncError::unsupported_property(owner, property, type_name))
            }
        }
    }
}

/// The fixed set of primitive-like types copied by value, with or without a
/// nullable wrapper.
pub fn is_assignment_type(descriptor: &TypeDescriptor) -> bool {
    match &descriptor.unwrap_nullable().shape {
        Shape::Primitive(PrimitiveKind::Boolean | PrimitiveKind::String | PrimitiveKind::Identifier) => true,
        Shape::Primitive(PrimitiveKind::Number(kind)) => ASSIGNMENT_NUMBERS.contains(kind),
        Shape::Primitive(PrimitiveKind::Timestamp(kind)) => ASSIGNMENT_TIMESTAMPS.contains(kind),
        _ => false,
    }
}

/// Derives the conversion strategy of `property` declared on `owner`.
pub fn classify_conversion(
    classifier: &Classifier<'_>,
    owner: &TypeHandle,
    property: &PropertyHandle,
) -> Result<ConversionStrategy> {
    let descriptor = classifier.classify(&property.ty)?;
    let strategy = strategy_for(classifier, owner, property, &descriptor)?;
    tracing::debug!(
        owner = %owner.name,
        property = %property.name,
        strategy = ?strategy,
        "Classified property conversion"
    );
    Ok(strategy)
}

/// Whether `property` may appear in a generated declaration at all.
pub fn is_supported_property_type(
    classifier: &Classifier<'_>,
    owner: &TypeHandle,
    property: &PropertyHandle,
) -> Result<bool> {
    Ok(classify_conversion(classifier, owner, property)?.is_supported())
}

fn strategy_for(
    classifier: &Classifier<'_>,
    owner: &TypeHandle,
    property: &PropertyHandle,
    descriptor: &TypeDescriptor,
) -> Result<ConversionStrategy> {
    let value = descriptor.unwrap_nullable();

    // Enumerations without an import path classify as plain numbers; they are
    // still excluded here.
    if unwrap_nullable_handle(&property.ty).kind == HandleKind::Enum {
        return Ok(if value.is_resolved_enumeration() {
            ConversionStrategy::DirectAssignment
        } else {
            unsupported(property)
        });
    }

    if is_assignment_type(descriptor) {
        return Ok(ConversionStrategy::DirectAssignment);
    }

    match &descriptor.shape {
        Shape::EntityReference { .. } => {
            let id_name = format!("{}{}", property.name, ID_SUFFIX);
            let sibling = match owner.property(&id_name) {
                Some(sibling) => id_sibling_kind(classifier, sibling)?,
                None => None,
            };
            Ok(ConversionStrategy::EntityToReference {
                id_property: sibling.map(|_| id_name),
                unwrap_required: sibling == Some(IdSibling::Required),
            })
        }
        Shape::Collection(element) if element.is_entity_reference() => {
            Ok(ConversionStrategy::EntityCollectionToReferenceList)
        }
        _ => Ok(unsupported(property)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdSibling {
    Required,
    Nullable,
}

fn id_sibling_kind(classifier: &Classifier<'_>, sibling: &PropertyHandle) -> Result<Option<IdSibling>> {
    let descriptor = classifier.classify(&sibling.ty)?;
    let kind = match &descriptor.shape {
        Shape::Primitive(PrimitiveKind::Number(number)) if number.is_integer() => Some(IdSibling::Required),
        Shape::NullableWrapper(inner) => match &inner.shape {
            Shape::Primitive(PrimitiveKind::Number(number)) if number.is_integer() => {
                Some(IdSibling::Nullable)
            }
            _ => None,
        },
        _ => None,
    };
    Ok(kind)
}

fn unwrap_nullable_handle(handle: &TypeHandle) -> &TypeHandle {
    if handle.is_system() && handle.name == "Nullable" && handle.generic_args.len() == 1 {
        &handle.generic_args[0]
    } else {
        handle
    }
}

fn unsupported(property: &PropertyHandle) -> ConversionStrategy {
    ConversionStrategy::Unsupported {
        type_name: property.ty.display_name(),
    }
}
