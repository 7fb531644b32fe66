//! Resource definition records.

use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::{DocumentUri, Span};

/// The five resource kinds a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Extends the tag vocabulary.
    CustomElement,
    /// Attaches to existing elements.
    CustomAttribute,
    /// Restructures the DOM.
    TemplateController,
    /// Expression tail after `|`.
    ValueConverter,
    /// Expression tail after `&`.
    BindingBehavior,
}

impl ResourceKind {
    /// Stable string form, used in symbol ids and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::CustomElement => "custom-element",
            ResourceKind::CustomAttribute => "custom-attribute",
            ResourceKind::TemplateController => "template-controller",
            ResourceKind::ValueConverter => "value-converter",
            ResourceKind::BindingBehavior => "binding-behavior",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a sourced value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcedOrigin {
    /// Read out of user source code.
    Source,
    /// Contributed by project configuration.
    Config,
    /// Shipped with the framework.
    Builtin,
}

/// A location in a source document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    /// The owning document.
    pub uri: DocumentUri,
    /// The span within it.
    pub span: Span,
}

/// A value together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sourced<T> {
    /// The value itself.
    pub value: T,
    /// Who produced it.
    pub origin: SourcedOrigin,
    /// Where it was written, when it came from source.
    pub location: Option<SourceLocation>,
}

impl<T> Sourced<T> {
    /// A builtin-origin value with no location.
    pub fn builtin(value: T) -> Self {
        Self {
            value,
            origin: SourcedOrigin::Builtin,
            location: None,
        }
    }

    /// A config-origin value with no location.
    pub fn config(value: T) -> Self {
        Self {
            value,
            origin: SourcedOrigin::Config,
            location: None,
        }
    }

    /// A source-origin value.
    pub fn source(value: T, location: Option<SourceLocation>) -> Self {
        Self {
            value,
            origin: SourcedOrigin::Source,
            location,
        }
    }
}

/// Binding modes a bindable can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingMode {
    /// Mode resolved by the runtime per target.
    #[default]
    Default,
    /// `one-time`
    OneTime,
    /// `to-view` (also `one-way`)
    ToView,
    /// `from-view`
    FromView,
    /// `two-way`
    TwoWay,
}

impl BindingMode {
    /// Parses the keyword forms accepted in `<bindable mode="…">` and
    /// decorator options.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "one-time" | "oneTime" => BindingMode::OneTime,
            "to-view" | "toView" | "one-way" | "oneWay" => BindingMode::ToView,
            "from-view" | "fromView" => BindingMode::FromView,
            "two-way" | "twoWay" => BindingMode::TwoWay,
            "default" => BindingMode::Default,
            _ => return None,
        })
    }
}

/// A declared bindable property.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BindableDef {
    /// The view-model property (camelCase).
    pub property: Sourced<SmolStr>,
    /// The attribute name it answers to (kebab-case).
    pub attribute: SmolStr,
    /// Declared binding mode.
    pub mode: BindingMode,
    /// True for the primary bindable of a custom attribute.
    pub primary: bool,
}

/// A resource definition.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceDef {
    /// The resource kind.
    pub kind: ResourceKind,
    /// The resource name (kebab-case for elements/attributes).
    pub name: Sourced<SmolStr>,
    /// The implementing class, when known.
    pub class_name: Option<Sourced<SmolStr>>,
    /// The defining document, when the resource came from source.
    pub file: Option<DocumentUri>,
    /// Alternative names.
    pub aliases: Vec<Sourced<SmolStr>>,
    /// Bindables keyed by property name, in declaration order.
    pub bindables: IndexMap<SmolStr, BindableDef>,
}

impl ResourceDef {
    /// True for template controllers.
    pub fn is_template_controller(&self) -> bool {
        self.kind == ResourceKind::TemplateController
    }

    /// All names this resource answers to: primary name plus aliases.
    pub fn all_names(&self) -> impl Iterator<Item = &SmolStr> {
        std::iter::once(&self.name.value).chain(self.aliases.iter().map(|a| &a.value))
    }

    /// Looks up a bindable by attribute target: exact property match first,
    /// then dash-to-camel, then attribute-name match.
    pub fn bindable_for_target(&self, target: &str) -> Option<(&SmolStr, &BindableDef)> {
        if let Some((key, def)) = self.bindables.get_key_value(target) {
            return Some((key, def));
        }
        let camel = dash_to_camel(target);
        if let Some((key, def)) = self.bindables.get_key_value(camel.as_str()) {
            return Some((key, def));
        }
        self.bindables
            .iter()
            .find(|(_, def)| def.attribute == target)
    }

    /// The primary bindable, when one is declared.
    pub fn primary_bindable(&self) -> Option<(&SmolStr, &BindableDef)> {
        self.bindables.iter().find(|(_, def)| def.primary)
    }
}

/// `full-name` → `fullName`.
pub fn dash_to_camel(input: &str) -> SmolStr {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;
    for ch in input.chars() {
        if ch == '-' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    SmolStr::from(out)
}

/// `FullName` / `fullName` → `full-name`.
pub fn camel_to_dash(input: &str) -> SmolStr {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, ch) in input.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    SmolStr::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn case_conversions() {
        assert_eq!(dash_to_camel("full-name").as_str(), "fullName");
        assert_eq!(dash_to_camel("value").as_str(), "value");
        assert_eq!(camel_to_dash("FullName").as_str(), "full-name");
        assert_eq!(camel_to_dash("dateFormat").as_str(), "date-format");
    }

    #[test]
    fn binding_mode_keywords() {
        assert_eq!(BindingMode::from_keyword("two-way"), Some(BindingMode::TwoWay));
        assert_eq!(BindingMode::from_keyword("twoWay"), Some(BindingMode::TwoWay));
        assert_eq!(BindingMode::from_keyword("one-way"), Some(BindingMode::ToView));
        assert_eq!(BindingMode::from_keyword("bogus"), None);
    }

    #[test]
    fn bindable_lookup_dash_to_camel() {
        let mut bindables = IndexMap::new();
        bindables.insert(
            SmolStr::from("fullName"),
            BindableDef {
                property: Sourced::builtin(SmolStr::from("fullName")),
                attribute: SmolStr::from("full-name"),
                mode: BindingMode::Default,
                primary: false,
            },
        );
        let def = ResourceDef {
            kind: ResourceKind::CustomElement,
            name: Sourced::builtin(SmolStr::from("person-card")),
            class_name: None,
            file: None,
            aliases: Vec::new(),
            bindables,
        };
        assert!(def.bindable_for_target("fullName").is_some());
        assert!(def.bindable_for_target("full-name").is_some());
        assert!(def.bindable_for_target("missing").is_none());
    }
}
