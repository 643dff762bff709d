//! Assigns every reflected type exactly one [`Shape`].
//!
//! Rules are tried in a fixed priority order and the first match wins; see
//! [`Classifier::classify`].

use crate::config::BagsyncConfig;
use crate::error::{BagsyncError, Result};
use crate::types::{
    Capability, HandleKind, Metadata, NumberKind, PrimitiveKind, PropertyHandle, Shape,
    TimestampKind, TypeDescriptor, TypeHandle,
};
use crate::typesync::config::ClassifierConfig;
use convert_case::{Case, Casing};

const BOOLEAN_TYPES: &[&str] = &["Boolean"];

const NUMBER_TYPES: &[(&str, NumberKind)] = &[
    ("Byte", NumberKind::Byte),
    ("SByte", NumberKind::SByte),
    ("Int16", NumberKind::Int16),
    ("UInt16", NumberKind::UInt16),
    ("Int32", NumberKind::Int32),
    ("UInt32", NumberKind::UInt32),
    ("Int64", NumberKind::Int64),
    ("UInt64", NumberKind::UInt64),
    ("Single", NumberKind::Single),
    ("Double", NumberKind::Double),
    ("Decimal", NumberKind::Decimal),
];

const STRING_TYPES: &[&str] = &["String", "Char"];

const IDENTIFIER_TYPES: &[&str] = &["Guid"];

const TIMESTAMP_TYPES: &[(&str, TimestampKind)] = &[
    ("DateTime", TimestampKind::DateTime),
    ("DateTimeOffset", TimestampKind::DateTimeOffset),
    ("DateOnly", TimestampKind::DateOnly),
    ("TimeOnly", TimestampKind::TimeOnly),
    ("TimeSpan", TimestampKind::TimeSpan),
];

const NULLABLE_WRAPPER: &str = "Nullable";

/// Generic definitions treated as dictionaries even when reflection did not
/// report the keyed-collection capability.
const DICTIONARY_DEFINITIONS: &[&str] = &[
    "Dictionary",
    "IDictionary",
    "IReadOnlyDictionary",
    "SortedDictionary",
];

const COLLECTION_DEFINITIONS: &[&str] = &[
    "List",
    "IList",
    "ICollection",
    "IEnumerable",
    "IReadOnlyList",
    "IReadOnlyCollection",
    "HashSet",
    "ISet",
];

/// Applies the domain-folder-name rule: entirely upper-case domains longer
/// than two characters become `Capitalized`, everything else is kept.
pub fn domain_folder_name(domain: &str) -> String {
    let has_letters = domain.chars().any(char::is_alphabetic);
    let all_upper = domain.chars().all(|c| !c.is_lowercase());
    if !has_letters || !all_upper || domain.chars().count() == 2 {
        return domain.to_string();
    }

    let mut chars = domain.chars();
    match chars.next() {
        Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// True when `namespace` is `root` or nested below it.
pub fn is_rooted_under(namespace: &str, root: &str) -> bool {
    !root.is_empty()
        && (namespace == root
            || namespace
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with('.')))
}

/// Strips `root` from `namespace` and turns the remainder into a `/`-separated
/// module path with a camel-cased final segment.
pub fn module_path(namespace: &str, root: &str) -> String {
    let rest = namespace
        .strip_prefix(root)
        .unwrap_or(namespace)
        .trim_start_matches('.');
    if rest.is_empty() {
        return String::new();
    }

    let mut segments: Vec<String> = rest.split('.').map(str::to_string).collect();
    if let Some(last) = segments.last_mut() {
        *last = last.to_case(Case::Camel);
    }
    segments.join("/")
}

pub struct Classifier<'a> {
    config: &'a ClassifierConfig,
    max_depth: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a BagsyncConfig) -> Self {
        Self {
            config: &config.classifier,
            max_depth: config.generation.max_type_depth,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        self.config
    }

    /// Classifies a handle and, recursively, its element and generic arguments.
    ///
    /// Priority order:
    /// 1. boolean, numeric and string primitives
    /// 2. nullable wrapper
    /// 3. identifier and timestamp primitives
    /// 4. arrays
    /// 5. dictionaries
    /// 6. single-element collections
    /// 7. the validity-tracking box
    /// 8. enumerations (global, domain-tagged, or degraded to a number)
    /// 9. generic parameters
    /// 10. persisted entities
    /// 11. view-models under the view-model root with a reserved suffix
    /// 12. anything else is unsupported
    pub fn classify(&self, handle: &TypeHandle) -> Result<TypeDescriptor> {
        self.classify_at(handle, 0)
    }

    /// Reads the metadata attached to a property of `owner`.
    pub fn property_metadata(&self, owner: &TypeHandle, property: &PropertyHandle) -> Result<Metadata> {
        Metadata::read(
            &property.annotations,
            &self.config.domain_annotation,
            &format!("{}.{}", owner.full_name(), property.name),
        )
    }

    fn classify_at(&self, handle: &TypeHandle, depth: usize) -> Result<TypeDescriptor> {
        if depth > self.max_depth {
            return Err(BagsyncError::MaxTypeDepth {
                depth: self.max_depth,
                type_name: handle.display_name(),
            });
        }

        let metadata = Metadata::read(
            &handle.annotations,
            &self.config.domain_annotation,
            &handle.full_name(),
        )?;
        let shape = self.classify_shape(handle, &metadata, depth)?;
        tracing::trace!(type_name = %handle.identity(), shape = %shape, "Classified type");

        Ok(TypeDescriptor::new(shape, handle.identity()).with_metadata(metadata))
    }

    fn classify_shape(&self, handle: &TypeHandle, metadata: &Metadata, depth: usize) -> Result<Shape> {
        let name = handle.name.as_str();
        let plain_system = handle.is_system()
            && handle.generic_args.is_empty()
            && !matches!(handle.kind, HandleKind::Enum | HandleKind::GenericParameter);

        // 1.
        if plain_system {
            if BOOLEAN_TYPES.contains(&name) {
                return Ok(Shape::Primitive(PrimitiveKind::Boolean));
            }
            if let Some((_, kind)) = NUMBER_TYPES.iter().find(|(n, _)| *n == name) {
                return Ok(Shape::Primitive(PrimitiveKind::Number(*kind)));
            }
            if STRING_TYPES.contains(&name) {
                return Ok(Shape::Primitive(PrimitiveKind::String));
            }
        }

        // 2.
        if handle.is_system() && name == NULLABLE_WRAPPER && handle.generic_args.len() == 1 {
            let inner = self.classify_at(&handle.generic_args[0], depth + 1)?;
            return Ok(Shape::NullableWrapper(Box::new(inner)));
        }

        // 3.
        if plain_system {
            if IDENTIFIER_TYPES.contains(&name) {
                return Ok(Shape::Primitive(PrimitiveKind::Identifier));
            }
            if let Some((_, kind)) = TIMESTAMP_TYPES.iter().find(|(n, _)| *n == name) {
                return Ok(Shape::Primitive(PrimitiveKind::Timestamp(*kind)));
            }
        }

        // 4.
        if handle.kind == HandleKind::Array {
            return match &handle.element {
                Some(element) => Ok(Shape::Array(Box::new(
                    self.classify_at(element, depth + 1)?,
                ))),
                None => Ok(unsupported(handle)),
            };
        }

        // 5.
        if handle.generic_args.len() == 2
            && (handle.has_capability(Capability::KeyedCollection)
                || DICTIONARY_DEFINITIONS.contains(&name))
        {
            let key = self.classify_at(&handle.generic_args[0], depth + 1)?;
            let value = self.classify_at(&handle.generic_args[1], depth + 1)?;
            return Ok(Shape::Dictionary(Box::new(key), Box::new(value)));
        }

        // 6.
        if handle.generic_args.len() == 1
            && (handle.has_capability(Capability::OrderedCollection)
                || COLLECTION_DEFINITIONS.contains(&name))
        {
            let element = self.classify_at(&handle.generic_args[0], depth + 1)?;
            return Ok(Shape::Collection(Box::new(element)));
        }

        // 7.
        if handle.generic_args.len() == 1 && name == self.config.box_type_name {
            let arg = self.classify_at(&handle.generic_args[0], depth + 1)?;
            return Ok(Shape::GenericContainer {
                name: name.to_string(),
                args: vec![arg],
            });
        }

        // 8.
        if handle.kind == HandleKind::Enum {
            return Ok(self.classify_enumeration(handle, metadata));
        }

        // 9.
        if handle.kind == HandleKind::GenericParameter {
            return Ok(Shape::GenericParameter {
                name: name.to_string(),
            });
        }

        // 10.
        if handle.has_capability(Capability::PersistedEntity) {
            return Ok(Shape::EntityReference {
                name: name.to_string(),
            });
        }

        // 11.
        if is_rooted_under(&handle.namespace, &self.config.view_model_root)
            && self
                .config
                .view_model_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
        {
            let args = handle
                .generic_args
                .iter()
                .map(|arg| self.classify_at(arg, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Shape::ViewModelReference {
                name: name.to_string(),
                path: module_path(&handle.namespace, &self.config.view_model_root),
                namespace: handle.namespace.clone(),
                args,
            });
        }

        // 12.
        Ok(unsupported(handle))
    }

    fn classify_enumeration(&self, handle: &TypeHandle, metadata: &Metadata) -> Shape {
        if is_rooted_under(&handle.namespace, &self.config.enumerations_root) {
            return Shape::EnumerationGlobal {
                name: handle.name.clone(),
                path: module_path(&handle.namespace, &self.config.enumerations_root),
                namespace: handle.namespace.clone(),
            };
        }

        if let Some(domain) = &metadata.domain {
            return Shape::EnumerationDomain {
                name: handle.name.clone(),
                domain: domain_folder_name(domain),
                namespace: handle.namespace.clone(),
            };
        }

        tracing::debug!(
            enum_name = %handle.full_name(),
            "Enumeration has no import path, degrading to number"
        );
        Shape::Primitive(PrimitiveKind::Number(NumberKind::Int32))
    }
}

fn unsupported(handle: &TypeHandle) -> Shape {
    Shape::Unsupported {
        type_name: handle.display_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, EnumMemberHandle};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn shape_of(handle: &TypeHandle) -> Shape {
        let config = BagsyncConfig::default();
        Classifier::new(&config).classify(handle).unwrap().shape
    }

    fn int32() -> TypeDescriptor {
        TypeDescriptor::new(
            Shape::Primitive(PrimitiveKind::Number(NumberKind::Int32)),
            "System.Int32",
        )
    }

    #[test]
    fn test_domain_folder_name() {
        assert_eq!(domain_folder_name("group"), "group");
        assert_eq!(domain_folder_name("Group"), "Group");
        assert_eq!(domain_folder_name("GR"), "GR");
        assert_eq!(domain_folder_name("GROUP"), "Group");
        assert_eq!(domain_folder_name("HR_OPS"), "Hr_ops");
        assert_eq!(domain_folder_name(""), "");
    }

    proptest! {
        #[test]
        fn prop_domain_folder_name_is_idempotent(domain in "[A-Za-z]{1,12}") {
            let once = domain_folder_name(&domain);
            prop_assert_eq!(domain_folder_name(&once), once.clone());
            prop_assert_eq!(once.to_lowercase(), domain.to_lowercase());
        }
    }

    #[test]
    fn test_module_path_camel_cases_last_segment() {
        assert_eq!(
            module_path("App.ViewModels.Billing.Invoices", "App.ViewModels"),
            "Billing/invoices"
        );
        assert_eq!(module_path("App.ViewModels", "App.ViewModels"), "");
    }

    #[test]
    fn test_is_rooted_under_requires_segment_boundary() {
        assert!(is_rooted_under("App.Enumerations", "App.Enumerations"));
        assert!(is_rooted_under("App.Enumerations.Sales", "App.Enumerations"));
        assert!(!is_rooted_under("App.EnumerationsLegacy", "App.Enumerations"));
        assert!(!is_rooted_under("App.Sales", ""));
    }

    #[test]
    fn test_primitives() {
        assert_eq!(
            shape_of(&TypeHandle::system("Boolean")),
            Shape::Primitive(PrimitiveKind::Boolean)
        );
        assert_eq!(
            shape_of(&TypeHandle::system("Decimal")),
            Shape::Primitive(PrimitiveKind::Number(NumberKind::Decimal))
        );
        assert_eq!(
            shape_of(&TypeHandle::string()),
            Shape::Primitive(PrimitiveKind::String)
        );
        assert_eq!(
            shape_of(&TypeHandle::system("Guid")),
            Shape::Primitive(PrimitiveKind::Identifier)
        );
        assert_eq!(
            shape_of(&TypeHandle::system("DateTimeOffset")),
            Shape::Primitive(PrimitiveKind::Timestamp(TimestampKind::DateTimeOffset))
        );
    }

    #[test]
    fn test_primitive_names_outside_system_are_not_primitives() {
        let shape = shape_of(&TypeHandle::named("App.Sales", "Decimal"));
        assert_eq!(
            shape,
            Shape::Unsupported {
                type_name: "Decimal".to_string()
            }
        );
    }

    #[test]
    fn test_nullable_wrapper_classifies_inner() {
        let shape = shape_of(&TypeHandle::nullable(TypeHandle::system("Int32")));
        assert_eq!(shape, Shape::NullableWrapper(Box::new(int32())));
    }

    #[test]
    fn test_array_and_collections() {
        assert_eq!(
            shape_of(&TypeHandle::array(TypeHandle::system("Int32"))),
            Shape::Array(Box::new(int32()))
        );
        assert_eq!(
            shape_of(&TypeHandle::list(TypeHandle::system("Int32"))),
            Shape::Collection(Box::new(int32()))
        );
        // Known definition without the capability flag.
        let icollection =
            TypeHandle::generic("System.Collections.Generic", "ICollection", vec![TypeHandle::system("Int32")]);
        assert_eq!(shape_of(&icollection), Shape::Collection(Box::new(int32())));
    }

    #[test]
    fn test_dictionary() {
        let shape = shape_of(&TypeHandle::dictionary(
            TypeHandle::string(),
            TypeHandle::system("Int32"),
        ));
        let Shape::Dictionary(key, value) = shape else {
            panic!("expected dictionary");
        };
        assert_eq!(key.shape, Shape::Primitive(PrimitiveKind::String));
        assert_eq!(*value, int32());
    }

    #[test]
    fn test_validity_box() {
        let handle = TypeHandle::generic("App.Shared.Validation", "Validated", vec![TypeHandle::string()]);
        let Shape::GenericContainer { name, args } = shape_of(&handle) else {
            panic!("expected generic container");
        };
        assert_eq!(name, "Validated");
        assert_eq!(args[0].shape, Shape::Primitive(PrimitiveKind::String));
    }

    #[test]
    fn test_global_enumeration() {
        let handle = TypeHandle::enumeration("App.Enumerations.Sales", "OrderStatus", vec![]);
        assert_eq!(
            shape_of(&handle),
            Shape::EnumerationGlobal {
                name: "OrderStatus".to_string(),
                path: "sales".to_string(),
                namespace: "App.Enumerations.Sales".to_string(),
            }
        );
    }

    #[test]
    fn test_domain_enumeration_applies_folder_rule() {
        let handle = TypeHandle::enumeration("App.Crm", "LeadSource", vec![])
            .with_annotation(Annotation::with_text("Domain", "CRM"));
        assert_eq!(
            shape_of(&handle),
            Shape::EnumerationDomain {
                name: "LeadSource".to_string(),
                domain: "Crm".to_string(),
                namespace: "App.Crm".to_string(),
            }
        );
    }

    #[test]
    fn test_root_wins_over_domain_annotation() {
        let handle = TypeHandle::enumeration("App.Enumerations", "Currency", vec![])
            .with_annotation(Annotation::with_text("Domain", "Finance"));
        assert!(matches!(shape_of(&handle), Shape::EnumerationGlobal { .. }));
    }

    #[test]
    fn test_unresolvable_enumeration_degrades_to_number() {
        let handle = TypeHandle::enumeration(
            "App.Internal",
            "Phase",
            vec![EnumMemberHandle::new("Start", 0)],
        );
        assert_eq!(
            shape_of(&handle),
            Shape::Primitive(PrimitiveKind::Number(NumberKind::Int32))
        );
    }

    #[test]
    fn test_malformed_domain_annotation_is_error() {
        let config = BagsyncConfig::default();
        let handle = TypeHandle::enumeration("App.Crm", "LeadSource", vec![])
            .with_annotation(Annotation::marker("Domain"));
        let err = Classifier::new(&config).classify(&handle).unwrap_err();
        assert!(matches!(err, BagsyncError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_generic_parameter_entity_and_view_model() {
        assert_eq!(
            shape_of(&TypeHandle::generic_parameter("TItem")),
            Shape::GenericParameter {
                name: "TItem".to_string()
            }
        );
        assert_eq!(
            shape_of(&TypeHandle::entity("App.Sales", "Customer")),
            Shape::EntityReference {
                name: "Customer".to_string()
            }
        );
        assert_eq!(
            shape_of(&TypeHandle::named("App.ViewModels.Sales.Orders", "OrderLineBag")),
            Shape::ViewModelReference {
                name: "OrderLineBag".to_string(),
                path: "Sales/orders".to_string(),
                namespace: "App.ViewModels.Sales.Orders".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_generic_view_model_classifies_arguments() {
        let handle = TypeHandle::generic(
            "App.ViewModels.Paging",
            "PageBox",
            vec![TypeHandle::named("App.ViewModels.Sales", "OrderLineBag")],
        );
        let Shape::ViewModelReference { name, path, args, .. } = shape_of(&handle) else {
            panic!("expected view-model reference");
        };
        assert_eq!(name, "PageBox");
        assert_eq!(path, "paging");
        assert_eq!(args.len(), 1);
        assert!(matches!(
            &args[0].shape,
            Shape::ViewModelReference { name, .. } if name == "OrderLineBag"
        ));
    }

    #[test]
    fn test_view_model_without_suffix_is_unsupported() {
        let shape = shape_of(&TypeHandle::named("App.ViewModels.Sales", "OrderSummary"));
        assert!(matches!(shape, Shape::Unsupported { .. }));
    }

    #[test]
    fn test_collection_wins_over_entity_capability() {
        let handle = TypeHandle::list(TypeHandle::entity("App.Sales", "Order"))
            .with_capability(Capability::PersistedEntity);
        assert!(matches!(shape_of(&handle), Shape::Collection(_)));
    }

    #[test]
    fn test_depth_limit() {
        let mut config = BagsyncConfig::default();
        config.generation.max_type_depth = 2;
        let nested = TypeHandle::list(TypeHandle::list(TypeHandle::list(TypeHandle::string())));
        let err = Classifier::new(&config).classify(&nested).unwrap_err();
        assert!(matches!(err, BagsyncError::MaxTypeDepth { depth: 2, .. }));
    }

    #[test]
    fn test_descriptor_carries_identity_and_metadata() {
        let config = BagsyncConfig::default();
        let handle = TypeHandle::enumeration("App.Enumerations", "Permission", vec![])
            .with_annotation(Annotation::marker("Flags"));
        let descriptor = Classifier::new(&config).classify(&handle).unwrap();
        assert_eq!(descriptor.identity, "App.Enumerations.Permission");
        assert!(descriptor.metadata.flags);
    }
}
