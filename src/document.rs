//! Document tree, document handle, and frontmatter location.
//!
//! The tree is deliberately shallow: a root holding a frontmatter node and
//! an opaque body. Only the leading fenced block is recognised:
//!
//! ```text
//! ---            +++
//! yaml: here     toml = "here"
//! ---            +++
//! body...        body...
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Source tag attached to every diagnostic this crate emits.
pub const DIAGNOSTIC_SOURCE: &str = "mdstamp";

/// Recognised frontmatter formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatterKind {
    /// YAML between `---` fences. The primary format.
    Yaml,
    /// TOML between `+++` fences.
    Toml,
}

impl MatterKind {
    /// All recognised kinds, primary first.
    pub const ALL: [MatterKind; 2] = [MatterKind::Yaml, MatterKind::Toml];

    /// The fence line delimiting a block of this kind.
    #[must_use]
    pub fn fence(self) -> &'static str {
        match self {
            MatterKind::Yaml => "---",
            MatterKind::Toml => "+++",
        }
    }
}

impl fmt::Display for MatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatterKind::Yaml => "yaml",
            MatterKind::Toml => "toml",
        })
    }
}

/// A frontmatter block: its format and raw (unfenced) content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterNode {
    /// Format of the block.
    pub kind: MatterKind,
    /// Raw content between the fences, without a trailing newline.
    pub value: String,
}

/// A direct child of the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A frontmatter block.
    Frontmatter(FrontmatterNode),
    /// Everything else, kept verbatim.
    Body(String),
}

/// Root of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Root {
    /// Ordered children.
    pub children: Vec<Node>,
}

impl Root {
    /// Splits `text` into an optional leading frontmatter block and a body.
    ///
    /// A document whose first line is a fence but which never closes it is
    /// treated as having no frontmatter.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut children = Vec::new();
        let rest = match split_frontmatter(text) {
            Some((node, body)) => {
                children.push(Node::Frontmatter(node));
                body
            }
            None => text,
        };
        if !rest.is_empty() {
            children.push(Node::Body(rest.to_string()));
        }
        Self { children }
    }

    /// Renders the tree back to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Frontmatter(node) => {
                    let fence = node.kind.fence();
                    out.push_str(fence);
                    out.push('\n');
                    if !node.value.is_empty() {
                        out.push_str(&node.value);
                        out.push('\n');
                    }
                    out.push_str(fence);
                    out.push('\n');
                }
                Node::Body(body) => out.push_str(body),
            }
        }
        out
    }
}

fn split_frontmatter(text: &str) -> Option<(FrontmatterNode, &str)> {
    let first_end = text.find('\n')?;
    let first = text[..first_end].trim_end();
    let kind = MatterKind::ALL.into_iter().find(|k| k.fence() == first)?;

    let content_start = first_end + 1;
    let mut offset = content_start;
    for line in text[content_start..].split_inclusive('\n') {
        if line.trim_end() == kind.fence() {
            let value = text[content_start..offset].trim_end_matches(['\n', '\r']);
            let body = &text[offset + line.len()..];
            return Some((FrontmatterNode { kind, value: value.to_string() }, body));
        }
        offset += line.len();
    }
    None
}

/// Returns the first direct child of `root` that is a frontmatter node.
#[must_use]
pub fn locate(root: &Root) -> Option<&FrontmatterNode> {
    root.children.iter().find_map(|child| match child {
        Node::Frontmatter(node) => Some(node),
        Node::Body(_) => None,
    })
}

/// Mutable variant of [`locate`].
pub fn locate_mut(root: &mut Root) -> Option<&mut FrontmatterNode> {
    root.children.iter_mut().find_map(|child| match child {
        Node::Frontmatter(node) => Some(node),
        Node::Body(_) => None,
    })
}

/// Creates an empty frontmatter node in the primary format.
#[must_use]
pub fn synthesize() -> FrontmatterNode {
    FrontmatterNode { kind: MatterKind::Yaml, value: String::new() }
}

/// A non-fatal problem recorded while stamping a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Subsystem that raised it.
    pub source: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.reason)
    }
}

/// Handle to the document being stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Where the document was read from. Time resolution queries this path.
    pub path: PathBuf,
    /// Where the rendered document will be written, if elsewhere.
    pub destination: Option<PathBuf>,
    /// Diagnostics collected while stamping.
    pub messages: Vec<Diagnostic>,
}

impl Document {
    /// Creates a handle for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), destination: None, messages: Vec::new() }
    }

    /// Sets the destination path hint.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Path the stamped output goes to: the destination if set, else the source.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.destination.as_deref().unwrap_or(&self.path)
    }

    /// Records a non-fatal diagnostic and logs it.
    pub fn message(&mut self, reason: impl Into<String>) {
        let diagnostic = Diagnostic { source: DIAGNOSTIC_SOURCE, reason: reason.into() };
        warn!(path = %self.path.display(), "{}", diagnostic.reason);
        self.messages.push(diagnostic);
    }
}
