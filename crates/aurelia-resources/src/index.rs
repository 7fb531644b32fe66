//! The resource-definition index.
//!
//! Collates builtins, config-contributed resources, and script-side facts
//! into one `SymbolId`-keyed map with name/alias lookup per kind. The index
//! is rebuilt whole whenever any analyzed script changes; readers hold the
//! build they started with.

use crate::builtins::builtin_resources;
use crate::facts::FileFacts;
use crate::{
    BindableDef, BindingMode, ResourceDef, ResourceKind, SourceLocation, Sourced, SymbolId,
    camel_to_dash, dash_to_camel,
};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// The collated resource index.
#[derive(Debug, Default)]
pub struct ResourceIndex {
    defs: IndexMap<SymbolId, ResourceDef>,
    /// (kind, name-or-alias) → symbol.
    by_name: FxHashMap<(ResourceKind, SmolStr), SymbolId>,
}

impl ResourceIndex {
    /// Builds an index from builtins plus the given facts and config
    /// resources. Later facts win name collisions within the same kind.
    pub fn build(facts: &[FileFacts], config_resources: &[ResourceDef]) -> Self {
        let mut index = ResourceIndex::default();
        for def in builtin_resources() {
            index.insert(def);
        }
        for def in config_resources {
            index.insert(def.clone());
        }
        for file in facts {
            for class in &file.classes {
                let Some(resource) = &class.resource else {
                    continue;
                };
                let location = resource.name_span.map(|span| SourceLocation {
                    uri: file.uri.clone(),
                    span,
                });
                let class_location = class.name_span.map(|span| SourceLocation {
                    uri: file.uri.clone(),
                    span,
                });
                let mut bindables = IndexMap::new();
                for bindable in &class.bindables {
                    let mode = bindable
                        .mode
                        .as_deref()
                        .and_then(BindingMode::from_keyword)
                        .unwrap_or_default();
                    let attribute = bindable
                        .attribute
                        .clone()
                        .unwrap_or_else(|| camel_to_dash(&bindable.property));
                    bindables.insert(
                        bindable.property.clone(),
                        BindableDef {
                            property: Sourced::source(
                                bindable.property.clone(),
                                bindable.span.map(|span| SourceLocation {
                                    uri: file.uri.clone(),
                                    span,
                                }),
                            ),
                            attribute,
                            mode,
                            primary: bindable.primary,
                        },
                    );
                }
                index.insert(ResourceDef {
                    kind: resource.kind,
                    name: Sourced::source(resource.name.clone(), location),
                    class_name: Some(Sourced::source(class.name.clone(), class_location)),
                    file: Some(file.uri.clone()),
                    aliases: resource
                        .aliases
                        .iter()
                        .map(|a| Sourced::source(a.clone(), None))
                        .collect(),
                    bindables,
                });
            }
        }
        index
    }

    fn insert(&mut self, def: ResourceDef) {
        let id = SymbolId::resource(
            def.kind,
            &def.name.value,
            def.file.as_deref(),
        );
        for name in def.all_names() {
            self.by_name.insert((def.kind, name.clone()), id.clone());
        }
        self.defs.insert(id, def);
    }

    /// Looks up a definition by symbol.
    pub fn get(&self, id: &SymbolId) -> Option<&ResourceDef> {
        self.defs.get(id)
    }

    /// All definitions, in deterministic insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolId, &ResourceDef)> {
        self.defs.iter()
    }

    fn lookup(&self, kind: ResourceKind, name: &str) -> Option<(&SymbolId, &ResourceDef)> {
        let id = self.by_name.get(&(kind, SmolStr::from(name)))?;
        self.defs.get_key_value(id)
    }

    /// Resolves a tag name to a custom element.
    pub fn element(&self, tag: &str) -> Option<(&SymbolId, &ResourceDef)> {
        self.lookup(ResourceKind::CustomElement, tag)
    }

    /// Resolves an attribute target to a template controller.
    pub fn controller(&self, target: &str) -> Option<(&SymbolId, &ResourceDef)> {
        self.lookup(ResourceKind::TemplateController, target)
            .or_else(|| self.lookup(ResourceKind::TemplateController, dash_to_camel(target).as_str()))
    }

    /// Resolves an attribute target to a custom attribute (not a
    /// controller).
    pub fn attribute(&self, target: &str) -> Option<(&SymbolId, &ResourceDef)> {
        self.lookup(ResourceKind::CustomAttribute, target)
            .or_else(|| self.lookup(ResourceKind::CustomAttribute, dash_to_camel(target).as_str()))
    }

    /// Resolves a converter name.
    pub fn converter(&self, name: &str) -> Option<(&SymbolId, &ResourceDef)> {
        self.lookup(ResourceKind::ValueConverter, name)
    }

    /// Resolves a behavior name.
    pub fn behavior(&self, name: &str) -> Option<(&SymbolId, &ResourceDef)> {
        self.lookup(ResourceKind::BindingBehavior, name)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True when only the empty build exists.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_file_facts;
    use pretty_assertions::assert_eq;

    fn sample_index() -> ResourceIndex {
        let facts = extract_file_facts(
            "/src/card.ts",
            r#"
@customElement({ name: 'my-card', aliases: ['card'] })
export class Card {
  @bindable title = '';
}
export class DateFormatValueConverter {}
"#,
        );
        ResourceIndex::build(&[facts], &[])
    }

    #[test]
    fn builtins_are_present() {
        let index = ResourceIndex::build(&[], &[]);
        assert!(index.controller("repeat").is_some());
        assert!(index.controller("if").is_some());
        assert!(index.behavior("throttle").is_some());
        assert!(index.attribute("focus").is_some());
        // Controllers are not custom attributes.
        assert!(index.attribute("repeat").is_none());
    }

    #[test]
    fn script_resources_resolve_by_name_and_alias() {
        let index = sample_index();
        let (id, def) = index.element("my-card").expect("element indexed");
        assert_eq!(def.class_name.as_ref().unwrap().value.as_str(), "Card");
        let (alias_id, _) = index.element("card").expect("alias indexed");
        assert_eq!(id, alias_id);
        assert!(index.converter("dateFormat").is_some());
    }

    #[test]
    fn bindables_carry_modes_and_attributes() {
        let index = sample_index();
        let (_, def) = index.element("my-card").unwrap();
        let (_, bindable) = def.bindable_for_target("title").unwrap();
        assert_eq!(bindable.attribute.as_str(), "title");
        assert_eq!(bindable.mode, BindingMode::Default);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let a = sample_index();
        let b = sample_index();
        let names_a: Vec<_> = a.iter().map(|(id, _)| id.clone()).collect();
        let names_b: Vec<_> = b.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn config_resources_are_config_sourced() {
        let config = vec![ResourceDef {
            kind: ResourceKind::ValueConverter,
            name: Sourced::config(SmolStr::from("currency")),
            class_name: None,
            file: None,
            aliases: Vec::new(),
            bindables: IndexMap::new(),
        }];
        let index = ResourceIndex::build(&[], &config);
        let (_, def) = index.converter("currency").unwrap();
        assert_eq!(def.name.origin, crate::SourcedOrigin::Config);
    }
}
