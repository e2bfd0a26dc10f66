//! Stamping configuration: library options and the YAML config file.
//!
//! ```yaml
//! git: true
//! fields:
//!   tag: blog                      # literal
//!   created: { time: created }
//!   updated: { time: modified }
//!   title: { compute: file-stem, update: if-missing }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::context::ServiceContext;
use crate::error::{Result, StampError};
use crate::field::{FieldSpec, FieldSpecs, TimeContext};
use crate::time::parse_timestamp;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".mdstamp.yaml";

/// Options for one stamping pass.
#[derive(Debug, Clone)]
pub struct StampConfig {
    /// Use git history for timestamps (falls back to file times when git is
    /// unavailable). `false` always uses file times.
    pub git: bool,
    /// Fields to compute and merge.
    pub metadata: FieldSpecs,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self { git: true, metadata: FieldSpecs::new() }
    }
}

impl StampConfig {
    /// Creates a config with git enabled and the given fields.
    #[must_use]
    pub fn new(metadata: FieldSpecs) -> Self {
        Self { metadata, ..Self::default() }
    }

    /// Selects the time source.
    #[must_use]
    pub fn with_git(mut self, git: bool) -> Self {
        self.git = git;
        self
    }

    /// Parses a YAML config document.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Config`] if the YAML is invalid or a field
    /// declaration is ambiguous.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| StampError::Config(e.to_string()))?
        };
        let mut metadata = FieldSpecs::new();
        for (key, value) in file.fields {
            let name = key
                .as_str()
                .ok_or_else(|| StampError::Config(format!("field name {key:?} is not a string")))?
                .to_string();
            let field: FieldConfig = serde_yaml::from_value(value)
                .map_err(|e| StampError::Config(format!("field `{name}`: {e}")))?;
            let spec = field.into_spec().map_err(|e| StampError::Config(format!("field `{name}`: {e}")))?;
            metadata.insert(name, spec);
        }
        Ok(Self { git: file.git, metadata })
    }

    /// Loads a config file through the context's filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Io`] if the file cannot be read, or
    /// [`StampError::Config`] if it is invalid.
    pub fn load(ctx: &ServiceContext, path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let text = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| StampError::Io { path: path.to_path_buf(), reason: e.to_string() })?;
        Self::from_yaml(&text)
    }
}

fn default_git() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_git")]
    git: bool,
    #[serde(default)]
    fields: serde_yaml::Mapping,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self { git: true, fields: serde_yaml::Mapping::new() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldConfig {
    Literal(String),
    Detailed(FieldDetail),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDetail {
    value: Option<String>,
    time: Option<TimeField>,
    compute: Option<Computed>,
    #[serde(default)]
    update: UpdateRule,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum TimeField {
    Created,
    Modified,
}

/// Built-in computed fields available from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Computed {
    /// The document's file name, e.g. `hello.md`.
    FileName,
    /// The file name without extension, e.g. `hello`.
    FileStem,
    /// Whole days between creation and last modification; empty if either is unknown.
    AgeDays,
}

impl Computed {
    /// Evaluates the computation against a time context.
    ///
    /// # Errors
    ///
    /// Returns an error if the document path has no file name.
    pub fn evaluate(
        self,
        ctx: &TimeContext<'_>,
    ) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let path = &ctx.document.path;
        let no_name = || format!("{} has no file name", path.display());
        match self {
            Computed::FileName => Ok(path
                .file_name()
                .ok_or_else(no_name)?
                .to_string_lossy()
                .into_owned()),
            Computed::FileStem => Ok(path
                .file_stem()
                .ok_or_else(no_name)?
                .to_string_lossy()
                .into_owned()),
            Computed::AgeDays => {
                match (parse_timestamp(&ctx.created_time), parse_timestamp(&ctx.modified_time)) {
                    (Some(created), Some(modified)) => {
                        Ok((modified - created).num_days().to_string())
                    }
                    _ => Ok(String::new()),
                }
            }
        }
    }
}

/// When a configured field may overwrite an existing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateRule {
    /// Always write the new value.
    #[default]
    Always,
    /// Never write; the field only keeps whatever the document already has.
    Never,
    /// Write only when the key is absent.
    IfMissing,
    /// Write when the key is absent or holds an empty string.
    IfEmpty,
}

impl UpdateRule {
    /// Wraps `spec` with the matching update policy.
    #[must_use]
    pub fn apply(self, spec: FieldSpec) -> FieldSpec {
        match self {
            UpdateRule::Always => spec,
            UpdateRule::Never => spec.should_update(|_, _| false),
            UpdateRule::IfMissing => spec.should_update(|_, old| old.is_none()),
            UpdateRule::IfEmpty => {
                spec.should_update(|_, old| old.map_or(true, |v| v.trim().is_empty()))
            }
        }
    }
}

impl FieldConfig {
    fn into_spec(self) -> std::result::Result<FieldSpec, String> {
        let detail = match self {
            FieldConfig::Literal(value) => return Ok(FieldSpec::Literal(value)),
            FieldConfig::Detailed(detail) => detail,
        };
        let spec = match (detail.value, detail.time, detail.compute) {
            (Some(value), None, None) => FieldSpec::Literal(value),
            (None, Some(TimeField::Created), None) => FieldSpec::CreatedTime,
            (None, Some(TimeField::Modified), None) => FieldSpec::ModifiedTime,
            (None, None, Some(computed)) => FieldSpec::compute(move |ctx| computed.evaluate(ctx)),
            (None, None, None) => {
                return Err("needs one of `value`, `time` or `compute`".to_string())
            }
            _ => return Err("only one of `value`, `time` and `compute` may be set".to_string()),
        };
        Ok(detail.update.apply(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::field::evaluate;

    fn ctx<'a>(doc: &'a Document, created: &str, modified: &str) -> TimeContext<'a> {
        TimeContext { created_time: created.into(), modified_time: modified.into(), document: doc }
    }

    #[test]
    fn default_config_uses_git_and_no_fields() {
        let config = StampConfig::default();
        assert!(config.git);
        assert!(config.metadata.is_empty());
        assert!(StampConfig::from_yaml("").unwrap().git);
    }

    #[test]
    fn parses_every_field_shape_in_order() {
        let config = StampConfig::from_yaml(
            "git: false\nfields:\n  tag: blog\n  created: { time: created }\n  updated: { time: modified, update: always }\n  title: { compute: file-stem, update: if-missing }\n  note: { value: hi }\n",
        )
        .unwrap();

        assert!(!config.git);
        let names: Vec<&str> = config.metadata.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["tag", "created", "updated", "title", "note"]);
        assert!(matches!(config.metadata.get("tag"), Some(FieldSpec::Literal(v)) if v == "blog"));
        assert!(matches!(config.metadata.get("created"), Some(FieldSpec::CreatedTime)));
        assert!(matches!(config.metadata.get("updated"), Some(FieldSpec::ModifiedTime)));
        assert!(config.metadata.get("title").unwrap().policy().is_some());
    }

    #[test]
    fn rejects_ambiguous_and_empty_fields() {
        let err = StampConfig::from_yaml("fields:\n  x: { value: a, time: created }\n").unwrap_err();
        assert!(err.to_string().contains("only one of"));

        let err = StampConfig::from_yaml("fields:\n  x: { update: never }\n").unwrap_err();
        assert!(err.to_string().contains("needs one of"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(StampConfig::from_yaml("gti: true\n").is_err());
        assert!(StampConfig::from_yaml("fields:\n  x: { time: yesterday }\n").is_err());
    }

    #[test]
    fn update_rules_map_to_policies() {
        let never = UpdateRule::Never.apply(FieldSpec::CreatedTime);
        let policy = never.policy().unwrap();
        assert!(!policy("new", Some("old")));
        assert!(!policy("new", None));

        let if_missing = UpdateRule::IfMissing.apply(FieldSpec::CreatedTime);
        let policy = if_missing.policy().unwrap();
        assert!(!policy("new", Some("old")));
        assert!(policy("new", None));

        let if_empty = UpdateRule::IfEmpty.apply(FieldSpec::CreatedTime);
        let policy = if_empty.policy().unwrap();
        assert!(policy("new", Some("")));
        assert!(!policy("new", Some("old")));

        assert!(UpdateRule::Always.apply(FieldSpec::CreatedTime).policy().is_none());
    }

    #[test]
    fn computed_fields() {
        let doc = Document::new("posts/hello world.md");
        let ctx = ctx(&doc, "Wed, 01 Jan 2020 00:00:00 GMT", "Sat, 11 Jan 2020 12:00:00 GMT");
        assert_eq!(Computed::FileName.evaluate(&ctx).unwrap(), "hello world.md");
        assert_eq!(Computed::FileStem.evaluate(&ctx).unwrap(), "hello world");
        assert_eq!(Computed::AgeDays.evaluate(&ctx).unwrap(), "10");
    }

    #[test]
    fn age_is_empty_when_a_time_is_unknown() {
        let doc = Document::new("a.md");
        let ctx = ctx(&doc, "", "Sat, 11 Jan 2020 12:00:00 GMT");
        assert_eq!(Computed::AgeDays.evaluate(&ctx).unwrap(), "");
    }

    #[test]
    fn configured_compute_runs_through_evaluator() {
        let config = StampConfig::from_yaml("fields:\n  slug: { compute: file-stem }\n").unwrap();
        let doc = Document::new("posts/intro.md");
        let spec = config.metadata.get("slug").unwrap();
        assert_eq!(evaluate("slug", spec, &ctx(&doc, "", "")).unwrap().as_deref(), Some("intro"));
    }
}
