//! Generation of the output crate's `Cargo.toml`.
//!
//! Dependencies are the union of everything the finalized units recorded.
//! Two entries for the same crate are merged: the features are combined and
//! the first version (in sorted order) wins.

use std::collections::{BTreeMap, BTreeSet};

use toml::{Table, Value};

use crate::errors::GeneratorError;
use crate::symbol::Dependency;

/// Header comment of the generated manifest.
pub const MANIFEST_MARKER: &str = "# Code generated by stencil-gen. DO NOT EDIT.";

/// Renders `Cargo.toml` for the generated crate.
///
/// ## Errors
///
/// Returns `CodeGenError` if TOML serialization fails.
///
/// ## Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use stencil_gen::codegen::manifest::generate_manifest;
/// use stencil_gen::symbol::Dependency;
///
/// let deps = BTreeSet::from([Dependency::serde_json()]);
/// let manifest = generate_manifest("weather-client", "0.1.0", &deps).unwrap();
/// assert!(manifest.contains("serde_json = \"1.0\""));
/// ```
pub fn generate_manifest(
    crate_name: &str,
    version: &str,
    dependencies: &BTreeSet<Dependency>,
) -> Result<String, GeneratorError> {
    let mut package = Table::new();
    package.insert("name".to_string(), Value::String(crate_name.to_string()));
    package.insert("version".to_string(), Value::String(version.to_string()));
    package.insert("edition".to_string(), Value::String("2021".to_string()));
    package.insert("publish".to_string(), Value::Boolean(false));

    let mut merged: BTreeMap<&str, Dependency> = BTreeMap::new();
    for dependency in dependencies {
        match merged.get_mut(dependency.name.as_str()) {
            Some(existing) => {
                for feature in &dependency.features {
                    if !existing.features.contains(feature) {
                        existing.features.push(feature.clone());
                    }
                }
            }
            None => {
                merged.insert(dependency.name.as_str(), dependency.clone());
            }
        }
    }

    let mut deps = Table::new();
    for (name, dependency) in merged {
        deps.insert(name.to_string(), dependency_value(&dependency));
    }

    let mut head = Table::new();
    head.insert("package".to_string(), Value::Table(package));
    let mut tail = Table::new();
    tail.insert("dependencies".to_string(), Value::Table(deps));

    let render = |table: &Table| {
        toml::to_string(table).map_err(|e| GeneratorError::CodeGenError(format!("Cargo.toml: {}", e)))
    };
    Ok(format!(
        "{}\n\n{}\n{}",
        MANIFEST_MARKER,
        render(&head)?,
        render(&tail)?
    ))
}

/// A version string, or a table when features or a git source are set.
fn dependency_value(dependency: &Dependency) -> Value {
    if dependency.features.is_empty() && dependency.git.is_none() {
        return Value::String(dependency.version.clone());
    }
    let mut table = Table::new();
    match &dependency.git {
        Some(git) => {
            table.insert("git".to_string(), Value::String(git.clone()));
        }
        None => {
            table.insert("version".to_string(), Value::String(dependency.version.clone()));
        }
    }
    if !dependency.features.is_empty() {
        let mut features = dependency.features.clone();
        features.sort();
        table.insert(
            "features".to_string(),
            Value::Array(features.into_iter().map(Value::String).collect()),
        );
    }
    Value::Table(table)
}
