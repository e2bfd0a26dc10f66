//! Field specifications and their evaluation.

use std::fmt;
use std::sync::Arc;

use crate::document::Document;
use crate::error::{Result, StampError};

/// Caller-supplied derivation of a field value from the document's times.
pub type ComputeFn = Arc<
    dyn Fn(&TimeContext<'_>) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Decides whether a freshly computed value (first argument) replaces the
/// existing one (second argument, `None` when the key is absent).
pub type UpdatePolicy = Arc<dyn Fn(&str, Option<&str>) -> bool + Send + Sync>;

/// What a compute function sees.
#[derive(Debug, Clone)]
pub struct TimeContext<'a> {
    /// Formatted modification time, empty when unknown.
    pub modified_time: String,
    /// Formatted creation time, empty when unknown.
    pub created_time: String,
    /// The document being stamped.
    pub document: &'a Document,
}

/// How one frontmatter field gets its value.
#[derive(Clone)]
pub enum FieldSpec {
    /// A fixed string.
    Literal(String),
    /// The document's creation time.
    CreatedTime,
    /// The document's last modification time.
    ModifiedTime,
    /// Derived by a function of the time context.
    Compute(ComputeFn),
    /// Any of the above plus an optional update policy.
    Record {
        /// Source of the value.
        value: Box<FieldSpec>,
        /// Policy consulted before overwriting; `None` always overwrites.
        should_update: Option<UpdatePolicy>,
    },
}

impl FieldSpec {
    /// A literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        FieldSpec::Literal(value.into())
    }

    /// A computed value.
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&TimeContext<'_>) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        FieldSpec::Compute(Arc::new(f))
    }

    /// Attaches an update policy, wrapping the spec in a record if needed.
    #[must_use]
    pub fn should_update<F>(self, policy: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> bool + Send + Sync + 'static,
    {
        let policy: UpdatePolicy = Arc::new(policy);
        match self {
            FieldSpec::Record { value, .. } => {
                FieldSpec::Record { value, should_update: Some(policy) }
            }
            other => FieldSpec::Record { value: Box::new(other), should_update: Some(policy) },
        }
    }

    /// The update policy, if any.
    #[must_use]
    pub fn policy(&self) -> Option<&UpdatePolicy> {
        match self {
            FieldSpec::Record { should_update, .. } => should_update.as_ref(),
            _ => None,
        }
    }

    /// Whether evaluating this spec may need the document's timestamps.
    #[must_use]
    pub fn needs_time(&self) -> bool {
        match self {
            FieldSpec::Literal(_) => false,
            FieldSpec::CreatedTime | FieldSpec::ModifiedTime | FieldSpec::Compute(_) => true,
            FieldSpec::Record { value, .. } => value.needs_time(),
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            FieldSpec::CreatedTime => f.write_str("CreatedTime"),
            FieldSpec::ModifiedTime => f.write_str("ModifiedTime"),
            FieldSpec::Compute(_) => f.write_str("Compute(..)"),
            FieldSpec::Record { value, should_update } => f
                .debug_struct("Record")
                .field("value", value)
                .field("should_update", &should_update.as_ref().map(|_| ".."))
                .finish(),
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(value: &str) -> Self {
        FieldSpec::literal(value)
    }
}

impl From<String> for FieldSpec {
    fn from(value: String) -> Self {
        FieldSpec::Literal(value)
    }
}

/// Field specs in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct FieldSpecs {
    entries: Vec<(String, FieldSpec)>,
}

impl FieldSpecs {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. Re-inserting a name replaces its spec in place.
    pub fn insert(&mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) {
        let name = name.into();
        let spec = spec.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((name, spec)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.insert(name, spec);
        self
    }

    /// Looks up a field's spec.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, spec)| spec)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.entries.iter().map(|(n, spec)| (n.as_str(), spec))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any field may need the document's timestamps.
    #[must_use]
    pub fn needs_time(&self) -> bool {
        self.entries.iter().any(|(_, spec)| spec.needs_time())
    }
}

impl<N: Into<String>, S: Into<FieldSpec>> FromIterator<(N, S)> for FieldSpecs {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut specs = FieldSpecs::new();
        for (name, spec) in iter {
            specs.insert(name, spec);
        }
        specs
    }
}

/// Produces the candidate value for `field`.
///
/// Returns `Ok(None)` when the spec has no recognised shape (a record nested
/// directly in a record); the field is then skipped for this pass.
///
/// # Errors
///
/// Returns [`StampError::Compute`] if a compute function fails.
pub fn evaluate(field: &str, spec: &FieldSpec, ctx: &TimeContext<'_>) -> Result<Option<String>> {
    let source = match spec {
        FieldSpec::Record { value, .. } => value.as_ref(),
        other => other,
    };
    match source {
        FieldSpec::CreatedTime => Ok(Some(ctx.created_time.clone())),
        FieldSpec::ModifiedTime => Ok(Some(ctx.modified_time.clone())),
        FieldSpec::Literal(s) => Ok(Some(s.clone())),
        FieldSpec::Compute(f) => f(ctx)
            .map(Some)
            .map_err(|e| StampError::Compute { field: field.to_string(), reason: e.to_string() }),
        FieldSpec::Record { .. } => Ok(None),
    }
}
