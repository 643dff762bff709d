//! Renders classified types as browser-runtime or managed-runtime type text.

use crate::config::BagsyncConfig;
use crate::error::{BagsyncError, Result};
use crate::types::{PrimitiveKind, Shape, TypeDescriptor};
use crate::typesync::TargetFormat;
use crate::typesync::imports::{ImportDescriptor, ImportSet};

pub const IDENTIFIER_HELPER: &str = "Identifier";
pub const REFERENCE_DESCRIPTOR: &str = "ReferenceDescriptor";
const MANAGED_IDENTIFIER: &str = "Guid";

/// Type text for one declaration site plus the imports it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Complete type text, including the absent-value marker when optional
    pub text: String,
    /// Whether the value may be absent; browser properties render as `name?:`
    pub optional: bool,
    pub imports: ImportSet,
}

impl Declaration {
    fn bare(text: impl Into<String>, imports: ImportSet) -> Self {
        Self {
            text: text.into(),
            optional: false,
            imports,
        }
    }
}

/// Token standing in for a type that could not be classified.
pub fn placeholder(format: TargetFormat) -> &'static str {
    match format {
        TargetFormat::Browser => "unknown",
        TargetFormat::Managed => "object",
    }
}

pub struct DeclarationMapper<'a> {
    config: &'a BagsyncConfig,
}

impl<'a> DeclarationMapper<'a> {
    pub fn new(config: &'a BagsyncConfig) -> Self {
        Self { config }
    }

    /// Maps a descriptor to declaration text.
    ///
    /// Nested element and argument types are always mapped as required; only
    /// the outermost shape decides whether to add the optional marker.
    pub fn map(
        &self,
        descriptor: &TypeDescriptor,
        is_required: bool,
        format: TargetFormat,
    ) -> Result<Declaration> {
        let inner = self.map_required(descriptor, format)?;
        if !is_optional(&descriptor.shape, is_required, format) {
            return Ok(inner);
        }

        let text = match format {
            TargetFormat::Browser => format!("{} | null", inner.text),
            TargetFormat::Managed => format!("{}?", inner.text),
        };
        Ok(Declaration {
            text,
            optional: true,
            imports: inner.imports,
        })
    }

    fn map_required(&self, descriptor: &TypeDescriptor, format: TargetFormat) -> Result<Declaration> {
        match &descriptor.shape {
            Shape::Primitive(kind) => Ok(self.map_primitive(*kind, format)),

            Shape::NullableWrapper(inner) => self.map_required(inner, format),

            Shape::Array(element) => {
                let element = self.map(element, true, format)?;
                let text = match format {
                    TargetFormat::Browser => format!("{}[]", browser_element(&element.text)),
                    TargetFormat::Managed => format!("{}[]", element.text),
                };
                Ok(Declaration::bare(text, element.imports))
            }

            Shape::Collection(element) => {
                let element = self.map(element, true, format)?;
                let text = match format {
                    TargetFormat::Browser => format!("{}[]", browser_element(&element.text)),
                    TargetFormat::Managed => format!("List<{}>", element.text),
                };
                Ok(Declaration::bare(text, element.imports))
            }

            Shape::Dictionary(key, value) => {
                let key = self.map(key, true, format)?;
                let value = self.map(value, true, format)?;
                let text = match format {
                    TargetFormat::Browser => format!("Record<{}, {}>", key.text, value.text),
                    TargetFormat::Managed => format!("Dictionary<{}, {}>", key.text, value.text),
                };
                let mut imports = key.imports;
                imports.merge(value.imports);
                Ok(Declaration::bare(text, imports))
            }

            Shape::GenericContainer { name, args } => {
                let path = match format {
                    TargetFormat::Browser => self.config.browser.box_import.clone(),
                    TargetFormat::Managed => self.config.managed.box_namespace.clone(),
                };
                self.map_generic(name, path, args, format)
            }

            Shape::EnumerationGlobal {
                name,
                path,
                namespace,
            } => {
                let import_path = match format {
                    TargetFormat::Browser => {
                        join_module(&self.config.browser.enumerations_import_root, path)
                    }
                    TargetFormat::Managed => namespace.clone(),
                };
                Ok(single_import(name, import_path))
            }

            Shape::EnumerationDomain {
                name,
                domain,
                namespace,
            } => {
                let import_path = match format {
                    TargetFormat::Browser => self
                        .config
                        .browser
                        .domain_enumerations_import
                        .replace("{domain}", domain),
                    TargetFormat::Managed => namespace.clone(),
                };
                Ok(single_import(name, import_path))
            }

            Shape::EntityReference { .. } => {
                let import_path = match format {
                    TargetFormat::Browser => self.config.browser.reference_import.clone(),
                    TargetFormat::Managed => self.config.managed.reference_namespace.clone(),
                };
                Ok(single_import(REFERENCE_DESCRIPTOR, import_path))
            }

            Shape::ViewModelReference {
                name,
                path,
                namespace,
                args,
            } => {
                let import_path = match format {
                    TargetFormat::Browser => {
                        join_module(&self.config.browser.view_models_import_root, path)
                    }
                    TargetFormat::Managed => namespace.clone(),
                };
                self.map_generic(name, import_path, args, format)
            }

            Shape::GenericParameter { name } => Ok(Declaration::bare(name.clone(), ImportSet::new())),

            Shape::Unsupported { type_name } => Err(BagsyncError::unsupported_type(type_name)),
        }
    }

    /// `Name<args>` importing `name` from `path` plus every argument import.
    /// Without arguments this is the bare name.
    fn map_generic(
        &self,
        name: &str,
        path: String,
        args: &[TypeDescriptor],
        format: TargetFormat,
    ) -> Result<Declaration> {
        let mut imports = ImportSet::new();
        imports.insert(ImportDescriptor::new(path, name));
        if args.is_empty() {
            return Ok(Declaration::bare(name, imports));
        }

        let mut arg_texts = Vec::with_capacity(args.len());
        for arg in args {
            let arg = self.map(arg, true, format)?;
            arg_texts.push(arg.text);
            imports.merge(arg.imports);
        }
        Ok(Declaration::bare(
            format!("{}<{}>", name, arg_texts.join(", ")),
            imports,
        ))
    }

    fn map_primitive(&self, kind: PrimitiveKind, format: TargetFormat) -> Declaration {
        match format {
            TargetFormat::Browser => match kind {
                PrimitiveKind::Boolean => Declaration::bare("boolean", ImportSet::new()),
                PrimitiveKind::Number(_) => Declaration::bare("number", ImportSet::new()),
                PrimitiveKind::String | PrimitiveKind::Timestamp(_) => {
                    Declaration::bare("string", ImportSet::new())
                }
                PrimitiveKind::Identifier => single_import(
                    IDENTIFIER_HELPER,
                    self.config.browser.identifier_import.clone(),
                ),
            },
            TargetFormat::Managed => match kind {
                PrimitiveKind::Boolean => Declaration::bare("bool", ImportSet::new()),
                PrimitiveKind::Number(number) => Declaration::bare(number.to_string(), ImportSet::new()),
                PrimitiveKind::String => Declaration::bare("string", ImportSet::new()),
                PrimitiveKind::Timestamp(timestamp) => {
                    Declaration::bare(timestamp.to_string(), ImportSet::new())
                }
                PrimitiveKind::Identifier => single_import(
                    MANAGED_IDENTIFIER,
                    self.config.managed.identifier_namespace.clone(),
                ),
            },
        }
    }
}

/// Nullability policy shared by both formats.
///
/// Nullable wrappers are always optional and generic parameters never are.
/// Booleans and numbers follow `is_required` in the browser format but are
/// value types in the managed format, where only a wrapper makes them
/// nullable. Every other shape is optional unless required.
pub fn is_optional(shape: &Shape, is_required: bool, format: TargetFormat) -> bool {
    match shape {
        Shape::NullableWrapper(_) => true,
        Shape::GenericParameter { .. } => false,
        Shape::Primitive(PrimitiveKind::Boolean | PrimitiveKind::Number(_)) => match format {
            TargetFormat::Browser => !is_required,
            TargetFormat::Managed => false,
        },
        Shape::Primitive(
            PrimitiveKind::String | PrimitiveKind::Identifier | PrimitiveKind::Timestamp(_),
        )
        | Shape::Array(_)
        | Shape::Collection(_)
        | Shape::Dictionary(_, _)
        | Shape::GenericContainer { .. }
        | Shape::EnumerationGlobal { .. }
        | Shape::EnumerationDomain { .. }
        | Shape::EntityReference { .. }
        | Shape::ViewModelReference { .. }
        | Shape::Unsupported { .. } => !is_required,
    }
}

fn single_import(name: &str, path: String) -> Declaration {
    let mut imports = ImportSet::new();
    imports.insert(ImportDescriptor::new(path, name));
    Declaration::bare(name, imports)
}

fn join_module(root: &str, path: &str) -> String {
    if path.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root.trim_end_matches('/'), path)
    }
}

/// Union element types need parentheses before `[]`.
fn browser_element(text: &str) -> String {
    if text.contains(" | ") {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, TypeHandle};
    use crate::typesync::classify::Classifier;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn map(handle: &TypeHandle, is_required: bool, format: TargetFormat) -> Declaration {
        let config = BagsyncConfig::default();
        let descriptor = Classifier::new(&config).classify(handle).unwrap();
        DeclarationMapper::new(&config)
            .map(&descriptor, is_required, format)
            .unwrap()
    }

    fn imports(declaration: &Declaration) -> Vec<ImportDescriptor> {
        declaration.imports.clone().into_vec()
    }

    #[test]
    fn test_nullability_composition() {
        let int = TypeHandle::system("Int32");
        let wrapped = map(&TypeHandle::nullable(int.clone()), true, TargetFormat::Browser);
        let not_required = map(&int, false, TargetFormat::Browser);
        let required = map(&int, true, TargetFormat::Browser);

        assert_eq!(wrapped, not_required);
        assert_eq!(wrapped.text, "number | null");
        assert!(wrapped.optional);
        assert_eq!(required.text, "number");
        assert!(!required.optional);
    }

    #[test]
    fn test_managed_value_types_only_nullable_through_wrapper() {
        let int = TypeHandle::system("Int32");
        assert_eq!(map(&int, false, TargetFormat::Managed).text, "int");
        assert_eq!(
            map(&TypeHandle::nullable(int), true, TargetFormat::Managed).text,
            "int?"
        );
        assert_eq!(
            map(&TypeHandle::system("Boolean"), false, TargetFormat::Managed).text,
            "bool"
        );
    }

    #[test]
    fn test_strings_follow_is_required() {
        assert_eq!(map(&TypeHandle::string(), true, TargetFormat::Browser).text, "string");
        assert_eq!(
            map(&TypeHandle::string(), false, TargetFormat::Browser).text,
            "string | null"
        );
        assert_eq!(map(&TypeHandle::string(), false, TargetFormat::Managed).text, "string?");
    }

    #[test]
    fn test_identifier_imports_helper() {
        let declaration = map(&TypeHandle::system("Guid"), false, TargetFormat::Browser);
        assert_eq!(declaration.text, "Identifier | null");
        assert_eq!(
            imports(&declaration),
            vec![ImportDescriptor::new("@/shared/identifier", "Identifier")]
        );

        let managed = map(&TypeHandle::system("Guid"), true, TargetFormat::Managed);
        assert_eq!(managed.text, "Guid");
        assert_eq!(imports(&managed), vec![ImportDescriptor::new("System", "Guid")]);
    }

    #[test]
    fn test_timestamp_is_context_dependent() {
        let handle = TypeHandle::system("DateTime");
        assert_eq!(map(&handle, true, TargetFormat::Browser).text, "string");
        assert_eq!(map(&handle, false, TargetFormat::Browser).text, "string | null");
        assert_eq!(map(&handle, false, TargetFormat::Managed).text, "DateTime?");
        assert_eq!(
            map(&TypeHandle::nullable(handle), true, TargetFormat::Managed).text,
            "DateTime?"
        );
    }

    #[test]
    fn test_collection_of_entities() {
        let handle = TypeHandle::generic(
            "System.Collections.Generic",
            "ICollection",
            vec![TypeHandle::entity("App.Sales", "Order")],
        );
        let browser = map(&handle, false, TargetFormat::Browser);
        assert_eq!(browser.text, "ReferenceDescriptor[] | null");
        assert_eq!(
            imports(&browser),
            vec![ImportDescriptor::new("@/shared/reference", "ReferenceDescriptor")]
        );

        let managed = map(&handle, true, TargetFormat::Managed);
        assert_eq!(managed.text, "List<ReferenceDescriptor>");
        assert_eq!(
            imports(&managed),
            vec![ImportDescriptor::new("App.Shared.References", "ReferenceDescriptor")]
        );
    }

    #[test]
    fn test_nested_nullable_element_is_parenthesised() {
        let handle = TypeHandle::array(TypeHandle::nullable(TypeHandle::system("Int32")));
        assert_eq!(map(&handle, true, TargetFormat::Browser).text, "(number | null)[]");
        assert_eq!(map(&handle, true, TargetFormat::Managed).text, "int?[]");
    }

    #[test]
    fn test_dictionary_unions_nested_imports() {
        let handle = TypeHandle::dictionary(
            TypeHandle::system("Guid"),
            TypeHandle::list(TypeHandle::entity("App.Sales", "Order")),
        );
        let declaration = map(&handle, true, TargetFormat::Browser);
        assert_eq!(declaration.text, "Record<Identifier, ReferenceDescriptor[]>");
        assert_eq!(
            imports(&declaration),
            vec![
                ImportDescriptor::new("@/shared/identifier", "Identifier"),
                ImportDescriptor::new("@/shared/reference", "ReferenceDescriptor"),
            ]
        );
        assert_eq!(
            map(&handle, true, TargetFormat::Managed).text,
            "Dictionary<Guid, List<ReferenceDescriptor>>"
        );
    }

    #[test]
    fn test_enumerations_import_by_path_or_domain() {
        let global = TypeHandle::enumeration("App.Enumerations.Sales", "OrderStatus", vec![]);
        let declaration = map(&global, true, TargetFormat::Browser);
        assert_eq!(declaration.text, "OrderStatus");
        assert_eq!(
            imports(&declaration),
            vec![ImportDescriptor::new("@/enumerations/sales", "OrderStatus")]
        );

        let domain = TypeHandle::enumeration("App.Crm", "LeadSource", vec![])
            .with_annotation(Annotation::with_text("Domain", "CRM"));
        let declaration = map(&domain, false, TargetFormat::Browser);
        assert_eq!(declaration.text, "LeadSource | null");
        assert_eq!(
            imports(&declaration),
            vec![ImportDescriptor::new("@/domains/Crm/enumerations", "LeadSource")]
        );
        assert_eq!(
            imports(&map(&domain, true, TargetFormat::Managed)),
            vec![ImportDescriptor::new("App.Crm", "LeadSource")]
        );
    }

    #[test]
    fn test_view_model_and_box() {
        let handle = TypeHandle::generic(
            "App.Shared.Validation",
            "Validated",
            vec![TypeHandle::named("App.ViewModels.Sales", "AddressBox")],
        );
        let declaration = map(&handle, true, TargetFormat::Browser);
        assert_eq!(declaration.text, "Validated<AddressBox>");
        assert_eq!(
            imports(&declaration),
            vec![
                ImportDescriptor::new("@/shared/validated", "Validated"),
                ImportDescriptor::new("@/viewModels/sales", "AddressBox"),
            ]
        );
    }

    #[test]
    fn test_generic_view_model_reference_keeps_arguments() {
        let handle = TypeHandle::generic(
            "App.ViewModels.Paging",
            "PageBox",
            vec![TypeHandle::named("App.ViewModels.Sales", "OrderLineBag")],
        );
        let declaration = map(&handle, false, TargetFormat::Browser);
        assert_eq!(declaration.text, "PageBox<OrderLineBag> | null");
        assert_eq!(
            imports(&declaration),
            vec![
                ImportDescriptor::new("@/viewModels/paging", "PageBox"),
                ImportDescriptor::new("@/viewModels/sales", "OrderLineBag"),
            ]
        );

        let managed = map(&handle, true, TargetFormat::Managed);
        assert_eq!(managed.text, "PageBox<OrderLineBag>");
        assert_eq!(
            imports(&managed),
            vec![
                ImportDescriptor::new("App.ViewModels.Paging", "PageBox"),
                ImportDescriptor::new("App.ViewModels.Sales", "OrderLineBag"),
            ]
        );
    }

    #[test]
    fn test_generic_parameter_never_wrapped() {
        let handle = TypeHandle::generic_parameter("T");
        assert_eq!(map(&handle, false, TargetFormat::Browser).text, "T");
        assert_eq!(map(&handle, false, TargetFormat::Managed).text, "T");
    }

    #[test]
    fn test_unsupported_is_error() {
        let config = BagsyncConfig::default();
        let descriptor = Classifier::new(&config)
            .classify(&TypeHandle::named("System", "IntPtr"))
            .unwrap();
        let err = DeclarationMapper::new(&config)
            .map(&descriptor, true, TargetFormat::Browser)
            .unwrap_err();
        assert_eq!(err.unsupported_type_name(), Some("IntPtr"));
    }

    fn arb_handle() -> impl Strategy<Value = TypeHandle> {
        let leaf = prop_oneof![
            Just(TypeHandle::system("Int32")),
            Just(TypeHandle::system("Guid")),
            Just(TypeHandle::string()),
            Just(TypeHandle::entity("App.Sales", "Order")),
            Just(TypeHandle::enumeration("App.Enumerations", "Currency", vec![])),
        ];
        leaf.prop_recursive(3, 12, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(TypeHandle::list),
                inner.clone().prop_map(TypeHandle::array),
                (inner.clone(), inner).prop_map(|(k, v)| TypeHandle::dictionary(k, v)),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_mapping_is_deterministic(handle in arb_handle(), is_required in any::<bool>()) {
            for format in [TargetFormat::Browser, TargetFormat::Managed] {
                let first = map(&handle, is_required, format);
                let second = map(&handle, is_required, format);
                prop_assert_eq!(first, second);
            }
        }
    }
}
