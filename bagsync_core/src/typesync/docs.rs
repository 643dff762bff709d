use crate::typesync::TargetFormat;
use convert_case::{Case, Casing};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<c>(.*?)</c>").expect("Invalid inline code regex"));

static SELF_CLOSING_SEE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<see\s+cref\s*=\s*"([^"]*)"\s*/>"#).expect("Invalid self-closing see regex")
});

static PAIRED_SEE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<see\s+cref\s*=\s*"[^"]*"\s*>(.*?)</see>"#).expect("Invalid paired see regex")
});

static EXCESS_BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid blank line regex"));

/// Member-kind prefix of a cross-reference that targets a field or
/// enumeration member. Those keep their declared casing.
const FIELD_PREFIX: &str = "F:";

/// Source of documentation text for types and their members.
pub trait DocumentationProvider: Send + Sync {
    /// Documentation of the type with the given full name.
    fn type_documentation(&self, type_name: &str) -> Option<&str>;

    /// Documentation of a property or enumeration member.
    fn member_documentation(&self, type_name: &str, member: &str) -> Option<&str>;
}

/// In-memory documentation keyed by full type name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationIndex {
    types: BTreeMap<String, String>,
    members: BTreeMap<String, BTreeMap<String, String>>,
}

impl DocumentationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_type(&mut self, type_name: impl Into<String>, text: impl Into<String>) {
        self.types.insert(type_name.into(), text.into());
    }

    pub fn insert_member(
        &mut self,
        type_name: impl Into<String>,
        member: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.members
            .entry(type_name.into())
            .or_default()
            .insert(member.into(), text.into());
    }

    pub fn with_type(mut self, type_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert_type(type_name, text);
        self
    }

    pub fn with_member(
        mut self,
        type_name: impl Into<String>,
        member: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert_member(type_name, member, text);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.members.is_empty()
    }
}

impl DocumentationProvider for DocumentationIndex {
    fn type_documentation(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name).map(String::as_str)
    }

    fn member_documentation(&self, type_name: &str, member: &str) -> Option<&str> {
        self.members
            .get(type_name)
            .and_then(|members| members.get(member))
            .map(String::as_str)
    }
}

/// Rewrites documentation text into a comment for `format`, every line
/// prefixed with `indent`. Returns `None` for empty or whitespace-only text.
///
/// Browser output converts cross-reference markup to JSDoc: `<c>x</c>` becomes
/// `` `x` ``, `<see cref="T:A.B.C"/>` becomes `{@link b.c}` and a paired
/// `<see cref="..">text</see>` keeps only its text. Managed output keeps the
/// markup inside a `<summary>` element.
pub fn rewrite_documentation(text: &str, format: TargetFormat, indent: &str) -> Option<String> {
    let normalized = text.replace("\r\n", "\n");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return None;
    }

    let comment = match format {
        TargetFormat::Browser => browser_comment(trimmed, indent),
        TargetFormat::Managed => managed_comment(trimmed, indent),
    };
    Some(comment)
}

/// Keeps text from closing the surrounding `/** */` block early.
pub(crate) fn escape_for_jsdoc(text: &str) -> String {
    text.replace("*/", "*\\/")
}

fn browser_comment(text: &str, indent: &str) -> String {
    let rewritten = escape_for_jsdoc(&rewrite_markup(text));
    if !rewritten.contains('\n') {
        return format!("{indent}/** {rewritten} */");
    }

    let collapsed = EXCESS_BLANK_LINES_RE.replace_all(&rewritten, "\n\n");
    let mut lines = vec![format!("{indent}/**")];
    for line in collapsed.lines().map(str::trim) {
        if line.is_empty() {
            lines.push(format!("{indent} *"));
        } else {
            lines.push(format!("{indent} * {line}"));
        }
    }
    lines.push(format!("{indent} */"));
    lines.join("\n")
}

fn managed_comment(text: &str, indent: &str) -> String {
    let mut lines = vec![format!("{indent}/// <summary>")];
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            lines.push(format!("{indent}///"));
        } else {
            lines.push(format!("{indent}/// {line}"));
        }
    }
    lines.push(format!("{indent}/// </summary>"));
    lines.join("\n")
}

fn rewrite_markup(text: &str) -> String {
    let text = INLINE_CODE_RE.replace_all(text, "`$1`");
    let text = SELF_CLOSING_SEE_RE.replace_all(&text, |caps: &Captures| link_token(&caps[1]));
    PAIRED_SEE_RE.replace_all(&text, "$1").into_owned()
}

/// `{@link}` token for a cross-reference target, built from its last two
/// dot-separated segments.
fn link_token(target: &str) -> String {
    let keep_case = target.starts_with(FIELD_PREFIX);
    let unprefixed = match target.split_once(':') {
        Some((prefix, rest)) if prefix.len() == 1 => rest,
        _ => target,
    };
    let without_args = unprefixed
        .split_once('(')
        .map_or(unprefixed, |(head, _)| head);

    let segments: Vec<&str> = without_args.split('.').collect();
    let tail = &segments[segments.len().saturating_sub(2)..];
    let link = tail
        .iter()
        .map(|segment| {
            if keep_case {
                segment.to_string()
            } else {
                segment.to_case(Case::Camel)
            }
        })
        .collect::<Vec<_>>()
        .join(".");
    format!("{{@link {link}}}")
}
