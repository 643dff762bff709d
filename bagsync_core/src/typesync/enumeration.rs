use crate::config::BagsyncConfig;
use crate::error::{BagsyncError, Result};
use crate::types::{HandleKind, Metadata, Obsolete, TypeHandle};
use crate::typesync::TargetFormat;
use crate::typesync::docs::{DocumentationProvider, escape_for_jsdoc, rewrite_documentation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

static ACRONYM_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("Invalid acronym boundary regex"));

static CASE_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid case boundary regex"));

const MEMBER_INDENT: &str = "  ";

/// One member of an enumeration, read once from its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationMember {
    pub field_name: String,
    pub raw_value: i64,
    pub description: Option<String>,
    pub obsolete: Option<Obsolete>,
    pub is_flags: bool,
}

impl EnumerationMember {
    pub fn is_obsolete(&self) -> bool {
        self.obsolete.is_some()
    }

    /// Literal for the value table.
    pub fn value_literal(&self) -> String {
        if self.is_flags && self.raw_value >= 0 {
            format!("0x{:04X}", self.raw_value)
        } else {
            self.raw_value.to_string()
        }
    }

    /// Key for the description table. Negative keys are bracketed.
    pub fn description_key(&self) -> String {
        if self.raw_value < 0 {
            format!("[{}]", self.raw_value)
        } else {
            self.raw_value.to_string()
        }
    }

    /// Description annotation text, or the field name split into words.
    pub fn description_text(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => split_words(&self.field_name),
        }
    }
}

/// `InProgress` -> `In Progress`, `HTTPServer` -> `HTTP Server`.
pub fn split_words(name: &str) -> String {
    let spaced = ACRONYM_BOUNDARY_RE.replace_all(name, "$1 $2");
    CASE_BOUNDARY_RE.replace_all(&spaced, "$1 $2").into_owned()
}

/// Members kept in the description table: declaration order, obsolete
/// members dropped when a non-obsolete member shares their value, and only
/// the first of any remaining duplicates.
pub fn description_entries(members: &[EnumerationMember]) -> Vec<&EnumerationMember> {
    let current_values: HashSet<i64> = members
        .iter()
        .filter(|member| !member.is_obsolete())
        .map(|member| member.raw_value)
        .collect();

    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|member| !(member.is_obsolete() && current_values.contains(&member.raw_value)))
        .filter(|member| seen.insert(member.raw_value))
        .collect()
}

/// Browser declarations for enumeration types: value table, description table
/// and alias type.
pub struct EnumerationGenerator<'a> {
    domain_annotation: &'a str,
    docs: Option<&'a dyn DocumentationProvider>,
}

impl<'a> EnumerationGenerator<'a> {
    pub fn new(config: &'a BagsyncConfig) -> Self {
        Self {
            domain_annotation: &config.classifier.domain_annotation,
            docs: None,
        }
    }

    pub fn with_documentation(mut self, docs: &'a dyn DocumentationProvider) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn members(&self, handle: &TypeHandle) -> Result<Vec<EnumerationMember>> {
        let type_metadata = self.type_metadata(handle)?;
        handle
            .members
            .iter()
            .map(|member| {
                let target = format!("{}.{}", handle.name, member.name);
                let metadata = Metadata::read(&member.annotations, self.domain_annotation, &target)?;
                Ok(EnumerationMember {
                    field_name: member.name.clone(),
                    raw_value: member.value,
                    description: metadata.description,
                    obsolete: metadata.obsolete,
                    is_flags: type_metadata.flags,
                })
            })
            .collect()
    }

    /// Renders the three declarations for `handle`, ending with a newline.
    pub fn generate(&self, handle: &TypeHandle) -> Result<String> {
        if handle.kind != HandleKind::Enum {
            return Err(BagsyncError::unsupported_type(handle.display_name()));
        }

        let metadata = self.type_metadata(handle)?;
        let members = self.members(handle)?;
        let name = &handle.name;
        let full_name = handle.full_name();
        debug!(
            enumeration = %full_name,
            members = members.len(),
            flags = metadata.flags,
            "Generating enumeration"
        );

        let mut out = String::new();

        // Value table
        if let Some(doc) = self
            .docs
            .and_then(|docs| docs.type_documentation(&full_name))
            .and_then(|text| rewrite_documentation(text, TargetFormat::Browser, ""))
        {
            out.push_str(&doc);
            out.push('\n');
        }
        if let Some(obsolete) = &metadata.obsolete {
            out.push_str(&deprecation_comment(obsolete, ""));
            out.push('\n');
        }
        out.push_str(&format!("export const {name} = {{\n"));
        for member in &members {
            if let Some(doc) = self
                .docs
                .and_then(|docs| docs.member_documentation(&full_name, &member.field_name))
                .and_then(|text| rewrite_documentation(text, TargetFormat::Browser, MEMBER_INDENT))
            {
                out.push_str(&doc);
                out.push('\n');
            }
            if let Some(obsolete) = &member.obsolete {
                out.push_str(&deprecation_comment(obsolete, MEMBER_INDENT));
                out.push('\n');
            }
            out.push_str(&format!(
                "{MEMBER_INDENT}{}: {},\n",
                member.field_name,
                member.value_literal()
            ));
        }
        out.push_str("} as const;\n\n");

        // Description table
        out.push_str(&format!("export const {name}Descriptions: Record<number, string> = {{\n"));
        for member in description_entries(&members) {
            out.push_str(&format!(
                "{MEMBER_INDENT}{}: {},\n",
                member.description_key(),
                string_literal(&member.description_text())?
            ));
        }
        out.push_str("};\n\n");

        // Alias
        if metadata.flags {
            out.push_str(&format!("export type {name} = number;\n"));
        } else {
            out.push_str(&format!("export type {name} = (typeof {name})[keyof typeof {name}];\n"));
        }

        Ok(out)
    }

    fn type_metadata(&self, handle: &TypeHandle) -> Result<Metadata> {
        Metadata::read(&handle.annotations, self.domain_annotation, &handle.full_name())
    }
}

/// Renders one enumeration with no documentation provider.
pub fn generate_enumeration(handle: &TypeHandle, config: &BagsyncConfig) -> Result<String> {
    EnumerationGenerator::new(config).generate(handle)
}

pub(crate) fn deprecation_comment(obsolete: &Obsolete, indent: &str) -> String {
    match obsolete.message.as_deref().map(str::trim) {
        Some(message) if !message.is_empty() => {
            format!("{indent}/** @deprecated {} */", escape_for_jsdoc(message))
        }
        _ => format!("{indent}/** @deprecated */"),
    }
}

fn string_literal(text: &str) -> Result<String> {
    Ok(serde_json::to_string(text)?)
}
