use crate::error::{BagsyncError, Result};
use crate::types::handle::{Annotation, AnnotationArg};
use serde::{Deserialize, Serialize};

pub const OBSOLETE_ANNOTATION: &str = "Obsolete";
pub const FLAGS_ANNOTATION: &str = "Flags";
pub const DESCRIPTION_ANNOTATION: &str = "Description";
pub const REQUIRED_ANNOTATION: &str = "Required";
pub const DEFAULT_DOMAIN_ANNOTATION: &str = "Domain";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Obsolete {
    pub message: Option<String>,
}

/// Typed view of the annotations attached to a type or member.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
    pub obsolete: Option<Obsolete>,
    pub flags: bool,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub required: bool,
}

impl Metadata {
    /// Reads the well-known annotations once. `target` names the annotated
    /// type or member in error messages.
    pub fn read(annotations: &[Annotation], domain_annotation: &str, target: &str) -> Result<Self> {
        let mut metadata = Metadata::default();

        for annotation in annotations {
            if annotation.is(OBSOLETE_ANNOTATION) {
                metadata.obsolete = Some(Obsolete {
                    message: annotation
                        .args
                        .first()
                        .and_then(AnnotationArg::as_text)
                        .map(str::to_string),
                });
            } else if annotation.is(FLAGS_ANNOTATION) {
                metadata.flags = true;
            } else if annotation.is(REQUIRED_ANNOTATION) {
                metadata.required = true;
            } else if annotation.is(DESCRIPTION_ANNOTATION) {
                let text = first_text_arg(annotation, target, "description text")?;
                metadata.description = Some(text.to_string());
            } else if annotation.is(domain_annotation) {
                let domain = first_text_arg(annotation, target, "domain name")?;
                if domain.trim().is_empty() {
                    return Err(BagsyncError::malformed_metadata(
                        &annotation.name,
                        target,
                        "domain name is empty",
                    ));
                }
                metadata.domain = Some(domain.to_string());
            }
        }

        Ok(metadata)
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete.is_some()
    }
}

fn first_text_arg<'a>(annotation: &'a Annotation, target: &str, what: &str) -> Result<&'a str> {
    annotation
        .args
        .first()
        .and_then(AnnotationArg::as_text)
        .ok_or_else(|| {
            BagsyncError::malformed_metadata(
                &annotation.name,
                target,
                format!("expected {} as first constructor argument", what),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(annotations: &[Annotation]) -> Result<Metadata> {
        Metadata::read(annotations, DEFAULT_DOMAIN_ANNOTATION, "App.Test")
    }

    #[test]
    fn test_reads_all_known_annotations() {
        let metadata = read(&[
            Annotation::with_text("ObsoleteAttribute", "Use Region instead"),
            Annotation::marker("Flags"),
            Annotation::with_text("Description", "Sales region"),
            Annotation::with_text("Domain", "SALES"),
            Annotation::marker("Required"),
        ])
        .unwrap();
        assert_eq!(
            metadata,
            Metadata {
                obsolete: Some(Obsolete {
                    message: Some("Use Region instead".to_string())
                }),
                flags: true,
                description: Some("Sales region".to_string()),
                domain: Some("SALES".to_string()),
                required: true,
            }
        );
    }

    #[test]
    fn test_obsolete_without_message() {
        let metadata = read(&[Annotation::marker("Obsolete")]).unwrap();
        assert_eq!(metadata.obsolete, Some(Obsolete { message: None }));
        assert!(metadata.is_obsolete());
    }

    #[test]
    fn test_domain_without_argument_is_malformed() {
        let err = read(&[Annotation::marker("Domain")]).unwrap_err();
        assert!(matches!(err, BagsyncError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_domain_with_non_text_argument_is_malformed() {
        let annotation = Annotation {
            name: "Domain".to_string(),
            args: vec![AnnotationArg::Int(4)],
        };
        assert!(read(&[annotation]).is_err());
    }

    #[test]
    fn test_unknown_annotations_are_ignored() {
        let metadata = read(&[Annotation::marker("Serializable")]).unwrap();
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn test_custom_domain_annotation_name() {
        let metadata = Metadata::read(
            &[Annotation::with_text("Area", "billing")],
            "Area",
            "App.Test",
        )
        .unwrap();
        assert_eq!(metadata.domain.as_deref(), Some("billing"));
    }
}
