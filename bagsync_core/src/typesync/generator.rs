//! Batch drivers: one generated file per call, every type in the batch
//! rendered independently and then sorted by name.

use crate::config::BagsyncConfig;
use crate::error::{BagsyncError, Result};
use crate::types::{Capability, HandleKind, Metadata, Obsolete, PropertyHandle, TypeHandle};
use crate::typesync::TargetFormat;
use crate::typesync::classify::Classifier;
use crate::typesync::config::Strictness;
use crate::typesync::conversion::{ConversionStrategy, classify_conversion, is_supported_property_type};
use crate::typesync::docs::{DocumentationProvider, rewrite_documentation};
use crate::typesync::enumeration::{EnumerationGenerator, deprecation_comment};
use crate::typesync::imports::{ImportDescriptor, ImportSet};
use crate::typesync::mapper::{Declaration, DeclarationMapper, placeholder};
use bon::Builder;
use convert_case::{Case, Casing};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

const BROWSER_INDENT: &str = "  ";
const MANAGED_INDENT: &str = "    ";

/// A problem lenient generation recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Full name of the type being generated
    pub type_name: String,
    pub member: Option<String>,
    pub message: String,
}

/// A type of the batch that could not be rendered at all.
#[derive(Debug)]
pub struct BatchFailure {
    /// Full name of the failed type
    pub type_name: String,
    pub error: BagsyncError,
}

/// Output of one batch, handed to the file assembly step.
///
/// Types that fail with a hard error are left out of `content` and listed in
/// `failures` in input order. The rest of the batch still renders.
#[derive(Debug, Default)]
pub struct GeneratedFile {
    pub content: String,
    pub imports: ImportSet,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<BatchFailure>,
}

impl GeneratedFile {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing view of the batch: the first failure in input order,
    /// or the file when every type rendered.
    pub fn into_result(mut self) -> Result<GeneratedFile> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(self.failures.remove(0).error)
        }
    }

    /// Import statements followed by the declarations.
    pub fn render(&self, format: TargetFormat) -> String {
        if self.imports.is_empty() {
            return self.content.clone();
        }
        format!("{}\n{}", self.imports.render(format), self.content)
    }
}

/// One type of a batch before sorting and import filtering.
struct RenderedType {
    name: String,
    full_name: String,
    content: String,
    imports: ImportSet,
    diagnostics: Vec<Diagnostic>,
}

impl RenderedType {
    fn new(name: impl Into<String>, handle: &TypeHandle) -> Self {
        Self {
            name: name.into(),
            full_name: handle.full_name(),
            content: String::new(),
            imports: ImportSet::new(),
            diagnostics: Vec::new(),
        }
    }
}

#[derive(Builder)]
pub struct Generator<'a> {
    config: &'a BagsyncConfig,
    docs: Option<&'a dyn DocumentationProvider>,
    /// Overrides `generation.strictness` from the configuration
    strictness: Option<Strictness>,
}

impl<'a> Generator<'a> {
    pub fn strictness(&self) -> Strictness {
        self.strictness.unwrap_or(self.config.generation.strictness)
    }

    /// `export interface` declarations for view-models and entities.
    /// Enumerations in the batch are rendered with the enumeration layout.
    pub fn generate_browser_declarations(&self, types: &[TypeHandle]) -> GeneratedFile {
        info!(
            type_count = types.len(),
            strictness = ?self.strictness(),
            "Generating browser declarations"
        );
        let results = types
            .par_iter()
            .map(|handle| self.render_browser_type(handle))
            .collect::<Vec<_>>();
        self.assemble(types, results, TargetFormat::Browser)
    }

    /// One `<Entity>Bag` class per entity with conversion members.
    pub fn generate_managed_bags(&self, entities: &[TypeHandle]) -> GeneratedFile {
        info!(
            type_count = entities.len(),
            strictness = ?self.strictness(),
            "Generating managed bags"
        );
        let results = entities
            .par_iter()
            .map(|entity| self.render_managed_bag(entity))
            .collect::<Vec<_>>();
        self.assemble(entities, results, TargetFormat::Managed)
    }

    pub fn generate_enumeration_batch(&self, enumerations: &[TypeHandle]) -> GeneratedFile {
        info!(
            type_count = enumerations.len(),
            "Generating enumeration batch"
        );
        let results = enumerations
            .par_iter()
            .map(|handle| {
                let mut unit = RenderedType::new(&handle.name, handle);
                if let Some(content) =
                    self.recover(self.enumerations().generate(handle), &mut unit.diagnostics, handle, None)?
                {
                    unit.content = content;
                }
                Ok(unit)
            })
            .collect::<Vec<_>>();
        self.assemble(enumerations, results, TargetFormat::Browser)
    }

    fn enumerations(&self) -> EnumerationGenerator<'a> {
        let generator = EnumerationGenerator::new(self.config);
        match self.docs {
            Some(docs) => generator.with_documentation(docs),
            None => generator,
        }
    }

    fn render_browser_type(&self, handle: &TypeHandle) -> Result<RenderedType> {
        let mut unit = RenderedType::new(&handle.name, handle);
        if handle.kind == HandleKind::Enum {
            unit.content = self.enumerations().generate(handle)?;
            return Ok(unit);
        }

        let classifier = Classifier::new(self.config);
        let mapper = DeclarationMapper::new(self.config);
        let metadata = self.type_metadata(handle)?;
        let is_entity = handle.has_capability(Capability::PersistedEntity);

        let mut fields: Vec<(String, String)> = Vec::with_capacity(handle.properties.len());
        for property in &handle.properties {
            if is_entity && !is_supported_property_type(&classifier, handle, property)? {
                debug!(
                    type_name = %unit.full_name,
                    property = %property.name,
                    "Skipping unsupported entity property"
                );
                continue;
            }

            let property_metadata = classifier.property_metadata(handle, property)?;
            let descriptor = classifier.classify(&property.ty)?;
            let declaration = self
                .recover(
                    mapper.map(&descriptor, property_metadata.required, TargetFormat::Browser),
                    &mut unit.diagnostics,
                    handle,
                    Some(property),
                )?
                .unwrap_or_else(|| fallback_declaration(TargetFormat::Browser, property_metadata.required));

            let name = property.name.to_case(Case::Camel);
            let mut text = String::new();
            self.push_comments(&mut text, handle, Some(property), &property_metadata, TargetFormat::Browser);
            let marker = if declaration.optional { "?" } else { "" };
            text.push_str(&format!("{BROWSER_INDENT}{name}{marker}: {};\n", declaration.text));

            unit.imports.merge(declaration.imports);
            fields.push((name, text));
        }
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut content = String::new();
        self.push_comments(&mut content, handle, None, &metadata, TargetFormat::Browser);
        content.push_str(&format!(
            "export interface {}{} {{\n",
            handle.name,
            type_parameters(handle)
        ));
        for (_, text) in fields {
            content.push_str(&text);
        }
        content.push_str("}\n");

        debug!(
            type_name = %unit.full_name,
            imports = unit.imports.len(),
            "Rendered browser declaration"
        );
        unit.content = content;
        Ok(unit)
    }

    fn render_managed_bag(&self, entity: &TypeHandle) -> Result<RenderedType> {
        let bag_name = format!("{}{}", entity.name, self.config.managed.bag_suffix);
        let mut unit = RenderedType::new(&bag_name, entity);
        if !entity.namespace.is_empty() {
            unit.imports
                .insert(ImportDescriptor::new(&entity.namespace, &entity.name));
        }

        let classifier = Classifier::new(self.config);
        let mapper = DeclarationMapper::new(self.config);
        let metadata = self.type_metadata(entity)?;

        let mut properties: Vec<&PropertyHandle> = entity.properties.iter().collect();
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        let strategies = properties
            .iter()
            .map(|property| classify_conversion(&classifier, entity, property))
            .collect::<Result<Vec<_>>>()?;

        // An id sibling is written back through its reference's GetId().
        let id_siblings: HashSet<&str> = strategies
            .iter()
            .filter_map(|strategy| match strategy {
                ConversionStrategy::EntityToReference {
                    id_property: Some(id_property),
                    ..
                } => Some(id_property.as_str()),
                _ => None,
            })
            .collect();

        let mut members = Vec::new();
        let mut to_bag = Vec::new();
        let mut from_bag = Vec::new();
        for (property, strategy) in properties.into_iter().zip(&strategies) {
            if let ConversionStrategy::Unsupported { type_name } = strategy {
                let error = BagsyncError::unsupported_property(&entity.name, &property.name, type_name);
                self.recover::<()>(Err(error), &mut unit.diagnostics, entity, Some(property))?;
                let marker = format!("// unknown property type: {type_name}");
                to_bag.push(format!("{MANAGED_INDENT}{MANAGED_INDENT}{MANAGED_INDENT}{marker}"));
                from_bag.push(format!("{MANAGED_INDENT}{MANAGED_INDENT}{marker}"));
                continue;
            }

            let property_metadata = classifier.property_metadata(entity, property)?;
            let descriptor = classifier.classify(&property.ty)?;
            let declaration = self
                .recover(
                    mapper.map(&descriptor, property_metadata.required, TargetFormat::Managed),
                    &mut unit.diagnostics,
                    entity,
                    Some(property),
                )?
                .unwrap_or_else(|| fallback_declaration(TargetFormat::Managed, property_metadata.required));

            let mut text = String::new();
            self.push_comments(&mut text, entity, Some(property), &property_metadata, TargetFormat::Managed);
            text.push_str(&format!(
                "{MANAGED_INDENT}public {} {} {{ get; set; }}\n",
                declaration.text, property.name
            ));
            unit.imports.merge(declaration.imports);
            members.push(text);

            to_bag.push(format!(
                "{MANAGED_INDENT}{MANAGED_INDENT}{MANAGED_INDENT}{},",
                strategy.render_to_bag(&entity.name, &property.name)?
            ));
            if id_siblings.contains(property.name.as_str()) {
                continue;
            }
            if let Some(line) = strategy.render_from_bag(&entity.name, &property.name)? {
                from_bag.push(format!("{MANAGED_INDENT}{MANAGED_INDENT}{line}"));
            }
        }

        let entity_name = &entity.name;
        let mut content = String::new();
        self.push_comments(&mut content, entity, None, &metadata, TargetFormat::Managed);
        content.push_str(&format!("public partial class {bag_name}\n{{\n"));
        for member in &members {
            content.push_str(member);
        }
        if !members.is_empty() {
            content.push('\n');
        }

        content.push_str(&format!(
            "{MANAGED_INDENT}public static {bag_name} FromEntity({entity_name} entity)\n\
             {MANAGED_INDENT}{{\n\
             {MANAGED_INDENT}{MANAGED_INDENT}return new {bag_name}\n\
             {MANAGED_INDENT}{MANAGED_INDENT}{{\n"
        ));
        for line in &to_bag {
            content.push_str(&format!("{line}\n"));
        }
        content.push_str(&format!(
            "{MANAGED_INDENT}{MANAGED_INDENT}}};\n{MANAGED_INDENT}}}\n\n"
        ));

        content.push_str(&format!(
            "{MANAGED_INDENT}public void ApplyTo({entity_name} entity)\n{MANAGED_INDENT}{{\n"
        ));
        for line in &from_bag {
            content.push_str(&format!("{line}\n"));
        }
        content.push_str(&format!("{MANAGED_INDENT}}}\n}}\n"));

        debug!(
            type_name = %unit.full_name,
            bag = %bag_name,
            imports = unit.imports.len(),
            "Rendered managed bag"
        );
        unit.content = content;
        Ok(unit)
    }

    /// Documentation then deprecation for a type (`property` is `None`) or
    /// one of its properties.
    fn push_comments(
        &self,
        out: &mut String,
        handle: &TypeHandle,
        property: Option<&PropertyHandle>,
        metadata: &Metadata,
        format: TargetFormat,
    ) {
        let full_name = handle.full_name();
        let indent = match (property, format) {
            (None, _) => "",
            (Some(_), TargetFormat::Browser) => BROWSER_INDENT,
            (Some(_), TargetFormat::Managed) => MANAGED_INDENT,
        };
        let provided = self.docs.and_then(|docs| match property {
            Some(property) => docs.member_documentation(&full_name, &property.name),
            None => docs.type_documentation(&full_name),
        });
        if let Some(doc) = provided
            .or(metadata.description.as_deref())
            .and_then(|text| rewrite_documentation(text, format, indent))
        {
            out.push_str(&doc);
            out.push('\n');
        }

        if let Some(obsolete) = &metadata.obsolete {
            match format {
                TargetFormat::Browser => out.push_str(&deprecation_comment(obsolete, indent)),
                TargetFormat::Managed => out.push_str(&obsolete_attribute(obsolete, indent)),
            }
            out.push('\n');
        }
    }

    fn type_metadata(&self, handle: &TypeHandle) -> Result<Metadata> {
        Metadata::read(
            &handle.annotations,
            &self.config.classifier.domain_annotation,
            &handle.full_name(),
        )
    }

    /// Lenient mode turns unsupported-type failures into `Ok(None)` plus a
    /// diagnostic. Everything else propagates.
    fn recover<T>(
        &self,
        result: Result<T>,
        diagnostics: &mut Vec<Diagnostic>,
        handle: &TypeHandle,
        property: Option<&PropertyHandle>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_unsupported() && self.strictness() == Strictness::Lenient => {
                let type_name = handle.full_name();
                let member = property.map(|p| p.name.clone());
                warn!(
                    type_name = %type_name,
                    member = ?member,
                    error = %error,
                    "Substituting placeholder for unsupported type"
                );
                diagnostics.push(Diagnostic {
                    type_name,
                    member,
                    message: error.to_string(),
                });
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn assemble(
        &self,
        handles: &[TypeHandle],
        results: Vec<Result<RenderedType>>,
        format: TargetFormat,
    ) -> GeneratedFile {
        let mut units = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (handle, result) in handles.iter().zip(results) {
            match result {
                Ok(unit) => units.push(unit),
                Err(error) => {
                    let type_name = handle.full_name();
                    warn!(type_name = %type_name, error = %error, "Type left out of batch");
                    failures.push(BatchFailure { type_name, error });
                }
            }
        }

        units.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.full_name.cmp(&b.full_name)));
        let defined: HashSet<String> = units.iter().map(|unit| unit.name.clone()).collect();

        let content = units
            .iter()
            .filter(|unit| !unit.content.is_empty())
            .map(|unit| unit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut imports = ImportSet::new();
        let mut diagnostics = Vec::new();
        for unit in units {
            imports.merge(unit.imports);
            diagnostics.extend(unit.diagnostics);
        }
        imports.exclude_defined(&defined);

        info!(
            format = %format,
            declarations = defined.len(),
            imports = imports.len(),
            diagnostics = diagnostics.len(),
            failures = failures.len(),
            "Batch generated"
        );
        GeneratedFile {
            content,
            imports,
            diagnostics,
            failures,
        }
    }
}

fn fallback_declaration(format: TargetFormat, is_required: bool) -> Declaration {
    let token = placeholder(format);
    let text = match (format, is_required) {
        (_, true) => token.to_string(),
        (TargetFormat::Browser, false) => format!("{token} | null"),
        (TargetFormat::Managed, false) => format!("{token}?"),
    };
    Declaration {
        text,
        optional: !is_required,
        imports: ImportSet::new(),
    }
}

fn type_parameters(handle: &TypeHandle) -> String {
    let names: Vec<&str> = handle
        .generic_args
        .iter()
        .filter(|arg| arg.kind == HandleKind::GenericParameter)
        .map(|arg| arg.name.as_str())
        .collect();
    if names.is_empty() {
        String::new()
    } else {
        format!("<{}>", names.join(", "))
    }
}

fn obsolete_attribute(obsolete: &Obsolete, indent: &str) -> String {
    match obsolete.message.as_deref() {
        Some(message) => format!(
            "{indent}[Obsolete(\"{}\")]",
            message.replace('\\', "\\\\").replace('"', "\\\"")
        ),
        None => format!("{indent}[Obsolete]"),
    }
}
