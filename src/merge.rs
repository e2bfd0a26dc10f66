//! Merges evaluated field values into existing frontmatter content.

use std::collections::HashMap;

use tracing::debug;

use crate::document::{FrontmatterNode, MatterKind};
use crate::error::{Result, StampError};
use crate::field::FieldSpecs;

/// A frontmatter mapping in its own format, so values the merge does not
/// touch keep their original types.
enum MatterMap {
    Yaml(serde_yaml::Mapping),
    Toml(toml::Table),
}

impl MatterMap {
    fn parse(kind: MatterKind, content: &str) -> Result<Self> {
        let malformed = |reason: String| StampError::Frontmatter { kind, reason };
        match kind {
            MatterKind::Yaml => {
                if content.trim().is_empty() {
                    return Ok(MatterMap::Yaml(serde_yaml::Mapping::new()));
                }
                match serde_yaml::from_str::<serde_yaml::Value>(content).map_err(|e| malformed(e.to_string()))? {
                    serde_yaml::Value::Null => Ok(MatterMap::Yaml(serde_yaml::Mapping::new())),
                    serde_yaml::Value::Mapping(map) => Ok(MatterMap::Yaml(map)),
                    other => Err(malformed(format!("expected a mapping, found {}", yaml_type(&other)))),
                }
            }
            MatterKind::Toml => content
                .parse::<toml::Table>()
                .map(MatterMap::Toml)
                .map_err(|e| malformed(e.to_string())),
        }
    }

    /// The existing value of `key` rendered as a string.
    fn get(&self, key: &str) -> Option<String> {
        match self {
            MatterMap::Yaml(map) => map.get(key).map(|v| match v {
                serde_yaml::Value::String(s) => s.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            }),
            MatterMap::Toml(table) => table.get(key).map(|v| match v {
                toml::Value::String(s) => s.clone(),
                toml::Value::Datetime(dt) => dt.to_string(),
                other => serde_json::to_string(other).unwrap_or_default(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: String) {
        match self {
            MatterMap::Yaml(map) => {
                map.insert(serde_yaml::Value::String(key.to_string()), serde_yaml::Value::String(value));
            }
            MatterMap::Toml(table) => {
                table.insert(key.to_string(), toml::Value::String(value));
            }
        }
    }

    fn serialize(&self) -> Result<String> {
        let text = match self {
            MatterMap::Yaml(map) => serde_yaml::to_string(map).map_err(|e| StampError::Serialize {
                kind: MatterKind::Yaml,
                reason: e.to_string(),
            })?,
            MatterMap::Toml(table) => toml::to_string(table).map_err(|e| StampError::Serialize {
                kind: MatterKind::Toml,
                reason: e.to_string(),
            })?,
        };
        Ok(text.trim().to_string())
    }
}

fn yaml_type(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Merges `values` into the content of `node` and returns the new content.
///
/// Fields are applied in `specs` order. A field without an evaluated value is
/// left alone. A field whose spec carries an update policy is only written
/// when the policy approves `(new, old)`; otherwise it is always written.
/// The node itself is not modified.
///
/// # Errors
///
/// Returns [`StampError::Frontmatter`] if the existing content is not a
/// mapping in the node's format, or [`StampError::Serialize`] if the result
/// cannot be written back.
pub fn merge(
    node: &FrontmatterNode,
    values: &HashMap<String, String>,
    specs: &FieldSpecs,
) -> Result<String> {
    let mut map = MatterMap::parse(node.kind, &node.value)?;

    for (name, spec) in specs.iter() {
        let Some(new_value) = values.get(name) else {
            continue;
        };
        let approved = match spec.policy() {
            None => true,
            Some(policy) => {
                let old = map.get(name);
                policy(new_value, old.as_deref())
            }
        };
        if approved {
            map.set(name, new_value.clone());
        } else {
            debug!(field = name, "update policy kept existing value");
        }
    }

    map.serialize()
}
