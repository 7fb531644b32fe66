//! Script-side facts.
//!
//! `FileFacts` is what the resource index consumes: one record per analyzed
//! companion script, listing the classes it declares, their resource
//! decorations, bindables, and public members. Facts are produced by the
//! swc extractor in this crate, or ingested as JSON from hosts that
//! pre-compute them.

use crate::ResourceKind;
use smol_str::SmolStr;
use source_map::{DocumentUri, Span};

/// Facts about one script file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacts {
    /// Normalized document URI.
    pub uri: DocumentUri,
    /// Classes declared in the file.
    pub classes: Vec<ClassFacts>,
}

/// Facts about one class declaration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFacts {
    /// The class name.
    pub name: SmolStr,
    /// Span of the class name in the script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_span: Option<Span>,
    /// Resource decoration, when the class declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceFacts>,
    /// `@bindable` properties.
    #[serde(default)]
    pub bindables: Vec<BindableFacts>,
    /// Public instance members.
    #[serde(default)]
    pub members: Vec<MemberFacts>,
}

/// How a class declares itself as a resource.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFacts {
    /// The resource kind.
    pub kind: ResourceKind,
    /// The declared resource name.
    pub name: SmolStr,
    /// Span of the name literal, when written in source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_span: Option<Span>,
    /// Declared aliases.
    #[serde(default)]
    pub aliases: Vec<SmolStr>,
    /// True for decorator declarations, false for class-name conventions.
    pub explicit: bool,
}

/// One `@bindable` property.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindableFacts {
    /// The property name.
    pub property: SmolStr,
    /// Span of the property name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Binding-mode keyword from the decorator options, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SmolStr>,
    /// Attribute-name override from the decorator options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<SmolStr>,
    /// True when marked primary.
    #[serde(default)]
    pub primary: bool,
}

/// The kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// A field or accessor.
    Property,
    /// A method.
    Method,
}

/// One public instance member.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFacts {
    /// The member name.
    pub name: SmolStr,
    /// Span of the member name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Field or method.
    pub kind: MemberKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facts_roundtrip_through_json() {
        let facts = FileFacts {
            uri: source_map::normalize_uri("/src/card.ts"),
            classes: vec![ClassFacts {
                name: SmolStr::from("CardCustomElement"),
                name_span: Some(Span::new(13u32, 30u32)),
                resource: Some(ResourceFacts {
                    kind: ResourceKind::CustomElement,
                    name: SmolStr::from("card"),
                    name_span: None,
                    aliases: vec![],
                    explicit: false,
                }),
                bindables: vec![BindableFacts {
                    property: SmolStr::from("title"),
                    span: None,
                    mode: Some(SmolStr::from("two-way")),
                    attribute: None,
                    primary: false,
                }],
                members: vec![MemberFacts {
                    name: SmolStr::from("save"),
                    span: None,
                    kind: MemberKind::Method,
                }],
            }],
        };
        let json = serde_json::to_string(&facts).unwrap();
        let back: FileFacts = serde_json::from_str(&json).unwrap();
        assert_eq!(facts, back);
    }
}
