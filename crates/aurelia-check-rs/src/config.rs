//! Configuration loading.

use aurelia_resources::{ResourceDef, ResourceKind, Sourced};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;
use std::fs;

/// `aurelia.json` at the workspace root. All keys optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Template file extensions to process.
    pub template_extensions: Vec<String>,

    /// Extra global names visible to the expression parser.
    pub global_names: Vec<String>,

    /// Extra attribute patterns.
    pub patterns: Vec<PatternConfig>,

    /// Config-contributed resources.
    pub resources: Vec<ResourceConfig>,
}

/// One configured attribute pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    /// The pattern template (`PART.PART`).
    pub pattern: String,
    /// The separator characters.
    pub symbols: String,
}

/// One configured resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    /// The resource kind (`custom-element`, `value-converter`, …).
    pub kind: ResourceKind,
    /// The resource name.
    pub name: String,
    /// Alternative names.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ProjectConfig {
    /// Loads `aurelia.json` from the workspace root, falling back to the
    /// defaults when absent or unreadable.
    pub fn load(workspace: &Utf8Path) -> Self {
        let path = workspace.join("aurelia.json");
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<ProjectConfig>(&text) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: failed to parse {path}: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: failed to read {path}: {e}");
                Self::default()
            }
        }
    }

    /// The template extensions, with the default applied.
    pub fn template_extensions(&self) -> Vec<String> {
        if self.template_extensions.is_empty() {
            vec![".html".to_string()]
        } else {
            self.template_extensions.clone()
        }
    }

    /// Config resources as definitions with origin `config`.
    pub fn resource_defs(&self) -> Vec<ResourceDef> {
        self.resources
            .iter()
            .map(|r| ResourceDef {
                kind: r.kind,
                name: Sourced::config(SmolStr::from(r.name.as_str())),
                class_name: None,
                file: None,
                aliases: r
                    .aliases
                    .iter()
                    .map(|a| Sourced::config(SmolStr::from(a.as_str())))
                    .collect(),
                bindables: IndexMap::new(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let config = ProjectConfig::load(Utf8Path::new("/definitely/not/here"));
        assert_eq!(config.template_extensions(), vec![".html".to_string()]);
        assert!(config.global_names.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let json = r#"{
            "templateExtensions": [".html", ".au.html"],
            "globalNames": ["luxon"],
            "patterns": [{ "pattern": "PART!", "symbols": "!" }],
            "resources": [
                { "kind": "value-converter", "name": "currency", "aliases": ["money"] }
            ]
        }"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.template_extensions().len(), 2);
        assert_eq!(config.patterns[0].pattern, "PART!");
        let defs = config.resource_defs();
        assert_eq!(defs[0].kind, ResourceKind::ValueConverter);
        assert_eq!(defs[0].aliases.len(), 1);
    }
}
