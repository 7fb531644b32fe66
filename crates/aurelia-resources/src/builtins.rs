//! Framework built-ins.
//!
//! The index is seeded with the template controllers, attributes, and
//! binding behaviors the framework ships, plus the attribute command set.
//! Built-ins carry `Sourced` origin `builtin` and are never renameable.

use crate::{BindableDef, BindingMode, ResourceDef, ResourceKind, Sourced};
use indexmap::IndexMap;
use smol_str::SmolStr;

/// The attribute commands understood by the compiler.
pub const BINDING_COMMANDS: &[&str] = &[
    "bind",
    "to-view",
    "from-view",
    "two-way",
    "one-time",
    "one-way",
    "trigger",
    "delegate",
    "capture",
    "call",
    "ref",
    "for",
    "as-element",
    "spread",
    "attr",
    "style",
];

/// True when `command` is a built-in attribute command.
pub fn is_binding_command(command: &str) -> bool {
    BINDING_COMMANDS.contains(&command)
}

/// Commands that bind a property or attribute value.
pub const PROPERTY_COMMANDS: &[&str] = &[
    "bind", "to-view", "from-view", "two-way", "one-time", "one-way", "attr", "style",
];

/// Commands that attach event listeners.
pub const LISTENER_COMMANDS: &[&str] = &["trigger", "delegate", "capture", "call"];

/// Built-in template controllers, by name and primary bindable.
const TEMPLATE_CONTROLLERS: &[(&str, &str)] = &[
    ("repeat", "items"),
    ("if", "value"),
    ("else", "value"),
    ("with", "value"),
    ("switch", "value"),
    ("case", "value"),
    ("default-case", "value"),
    ("promise", "value"),
    ("pending", "value"),
    ("then", "value"),
    ("catch", "value"),
    ("portal", "target"),
];

/// Built-in custom attributes.
const CUSTOM_ATTRIBUTES: &[(&str, &str)] = &[("focus", "value"), ("show", "value")];

/// Built-in binding behaviors.
const BINDING_BEHAVIORS: &[&str] = &[
    "oneTime",
    "toView",
    "fromView",
    "twoWay",
    "debounce",
    "throttle",
    "signal",
    "updateTrigger",
    "self",
    "attr",
];

/// Built-in value converters. The framework ships none; the slice keeps the
/// seeding code uniform and gives config a place to append.
const VALUE_CONVERTERS: &[&str] = &[];

fn primary_bindable(property: &str) -> IndexMap<SmolStr, BindableDef> {
    let mut bindables = IndexMap::new();
    bindables.insert(
        SmolStr::from(property),
        BindableDef {
            property: Sourced::builtin(SmolStr::from(property)),
            attribute: crate::camel_to_dash(property),
            mode: BindingMode::Default,
            primary: true,
        },
    );
    bindables
}

fn builtin_def(
    kind: ResourceKind,
    name: &str,
    bindables: IndexMap<SmolStr, BindableDef>,
) -> ResourceDef {
    ResourceDef {
        kind,
        name: Sourced::builtin(SmolStr::from(name)),
        class_name: None,
        file: None,
        aliases: Vec::new(),
        bindables,
    }
}

/// All built-in resource definitions.
pub fn builtin_resources() -> Vec<ResourceDef> {
    let mut defs = Vec::new();
    for (name, property) in TEMPLATE_CONTROLLERS {
        defs.push(builtin_def(
            ResourceKind::TemplateController,
            name,
            primary_bindable(property),
        ));
    }
    for (name, property) in CUSTOM_ATTRIBUTES {
        defs.push(builtin_def(
            ResourceKind::CustomAttribute,
            name,
            primary_bindable(property),
        ));
    }
    for name in BINDING_BEHAVIORS {
        defs.push(builtin_def(
            ResourceKind::BindingBehavior,
            name,
            IndexMap::new(),
        ));
    }
    for name in VALUE_CONVERTERS {
        defs.push(builtin_def(
            ResourceKind::ValueConverter,
            name,
            IndexMap::new(),
        ));
    }
    defs
}

/// Scope-local names the framework injects into `repeat` frames.
pub const REPEAT_CONTEXTUALS: &[&str] =
    &["$index", "$first", "$last", "$even", "$odd", "$length"];

/// Names that can never be renamed: contextuals plus scope keywords.
pub const NON_RENAMEABLE_NAMES: &[&str] = &[
    "$index", "$first", "$last", "$even", "$odd", "$length", "$this", "$parent", "$event",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controllers_are_seeded() {
        let defs = builtin_resources();
        let repeat = defs
            .iter()
            .find(|d| d.name.value == "repeat")
            .expect("repeat is built in");
        assert!(repeat.is_template_controller());
        assert!(repeat.bindables.contains_key("items"));
    }

    #[test]
    fn command_set() {
        assert!(is_binding_command("bind"));
        assert!(is_binding_command("as-element"));
        assert!(!is_binding_command("bogus"));
    }
}
