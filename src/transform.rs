//! The per-document stamping pass.

use std::collections::HashMap;

use tracing::debug;

use crate::config::StampConfig;
use crate::context::ServiceContext;
use crate::document::{locate, locate_mut, synthesize, Document, Node, Root};
use crate::error::Result;
use crate::field::{evaluate, TimeContext};
use crate::merge::merge;
use crate::time::{ResolvedTimes, TimeResolver};

/// Stamps the configured metadata into the frontmatter of `root`.
///
/// The first frontmatter child is merged into; if there is none, a fresh
/// YAML block is created and becomes the first child. Timestamps are
/// resolved at most once and only when some field may need them.
/// Non-fatal problems are collected on `doc`.
///
/// # Errors
///
/// Returns the first fatal error (failed history query, compute failure,
/// malformed or unserializable frontmatter). The tree is left untouched.
pub fn transform(
    root: &mut Root,
    doc: &mut Document,
    config: &StampConfig,
    ctx: &ServiceContext,
) -> Result<()> {
    let specs = &config.metadata;

    let times = if specs.needs_time() {
        TimeResolver::new(ctx, config.git).resolve(doc)?
    } else {
        debug!(path = %doc.path.display(), "no time fields, skipping resolution");
        ResolvedTimes::default()
    };

    let time_ctx = TimeContext {
        modified_time: times.modified,
        created_time: times.created,
        document: doc,
    };
    let mut values = HashMap::with_capacity(specs.len());
    for (name, spec) in specs.iter() {
        match evaluate(name, spec, &time_ctx)? {
            Some(value) => {
                values.insert(name.to_string(), value);
            }
            None => debug!(field = name, "unrecognised field spec, skipped"),
        }
    }

    let content = match locate(root) {
        Some(node) => merge(node, &values, specs)?,
        None => merge(&synthesize(), &values, specs)?,
    };

    match locate_mut(root) {
        Some(node) => node.value = content,
        None => {
            let mut node = synthesize();
            node.value = content;
            root.children.insert(0, Node::Frontmatter(node));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::document::MatterKind;
    use crate::error::StampError;
    use crate::field::{FieldSpec, FieldSpecs};
    use crate::ports::HistoryError;
    use crate::testing::{FakeFs, FakeGit};

    const RETAINED: &str = "Thu, 22 Oct 2020 06:47:56 GMT";

    fn fs_with_times(path: &str) -> FakeFs {
        FakeFs::default().with_times(
            path,
            Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap(),
        )
    }

    fn frontmatter(root: &Root) -> &str {
        &locate(root).unwrap().value
    }

    #[test]
    fn missing_frontmatter_is_created_with_modified_time() {
        let ctx = ServiceContext::with_ports(
            Box::new(fs_with_times("no.md")),
            Box::new(FakeGit::with_history(&[])),
        );
        let config = StampConfig::new(FieldSpecs::new().with("lastModifiedAt", FieldSpec::ModifiedTime))
            .with_git(false);
        let mut root = Root::parse("# No frontmatter\n");
        let mut doc = Document::new("no.md");

        transform(&mut root, &mut doc, &config, &ctx).unwrap();

        assert!(matches!(root.children[0], Node::Frontmatter(_)));
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(frontmatter(&root)).unwrap();
        assert_eq!(
            parsed.get("lastModifiedAt").and_then(|v| v.as_str()),
            Some("Mon, 01 Mar 2021 00:00:00 GMT")
        );
        assert_eq!(root.children[1], Node::Body("# No frontmatter\n".into()));
        assert!(doc.messages.is_empty());
    }

    #[test]
    fn never_update_policy_keeps_existing_value_and_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let specs = FieldSpecs::new().with(
            "lastModifiedAt",
            FieldSpec::ModifiedTime.should_update(move |_, old| {
                seen.fetch_add(1, Ordering::SeqCst);
                assert_eq!(old, Some(RETAINED));
                false
            }),
        );
        let config = StampConfig::new(specs).with_git(false);
        let ctx = ServiceContext::with_ports(
            Box::new(fs_with_times("existing.md")),
            Box::new(FakeGit::with_history(&[])),
        );
        let mut root = Root::parse(&format!("---\nlastModifiedAt: '{RETAINED}'\n---\nBody\n"));
        let mut doc = Document::new("existing.md");

        transform(&mut root, &mut doc, &config, &ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = root.render();
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(frontmatter(&root)).unwrap();
        assert_eq!(parsed.get("lastModifiedAt").and_then(|v| v.as_str()), Some(RETAINED));

        transform(&mut root, &mut doc, &config, &ctx).unwrap();
        assert_eq!(root.render(), first);
    }

    #[test]
    fn literal_field_is_written() {
        let ctx = ServiceContext::with_ports(
            Box::new(FakeFs::default()),
            Box::new(FakeGit::with_history(&[])),
        );
        let config = StampConfig::new(FieldSpecs::new().with("foo", "bar"));
        let mut root = Root::parse("text\n");
        let mut doc = Document::new("a.md");

        transform(&mut root, &mut doc, &config, &ctx).unwrap();
        assert_eq!(root.render(), "---\nfoo: bar\n---\ntext\n");
    }

    #[test]
    fn empty_specs_create_empty_mapping() {
        let ctx = ServiceContext::with_ports(
            Box::new(FakeFs::default()),
            Box::new(FakeGit::with_history(&[])),
        );
        let mut root = Root::default();
        let mut doc = Document::new("a.md");

        transform(&mut root, &mut doc, &StampConfig::default(), &ctx).unwrap();
        assert_eq!(root.render(), "---\n{}\n---\n");
    }

    #[test]
    fn literal_only_specs_never_query_time_sources() {
        let git = FakeGit::failing(HistoryError::Failed("must not run".into()));
        let calls = git.calls();
        let ctx = ServiceContext::with_ports(Box::new(FakeFs::default()), Box::new(git));
        let config = StampConfig::new(FieldSpecs::new().with("tag", "blog"));
        let mut root = Root::default();
        let mut doc = Document::new("missing.md");

        transform(&mut root, &mut doc, &config, &ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(doc.messages.is_empty());
    }

    #[test]
    fn times_are_resolved_once_per_document() {
        let git = FakeGit::with_history(&["2019-01-05T12:00:00+00:00", "2020-10-22T06:47:56+00:00"]);
        let calls = git.calls();
        let ctx = ServiceContext::with_ports(Box::new(FakeFs::default()), Box::new(git));
        let specs = FieldSpecs::new()
            .with("created", FieldSpec::CreatedTime)
            .with("updated", FieldSpec::ModifiedTime)
            .with("again", FieldSpec::ModifiedTime);
        let mut root = Root::default();
        let mut doc = Document::new("a.md");

        transform(&mut root, &mut doc, &StampConfig::new(specs), &ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(frontmatter(&root)).unwrap();
        let keys: Vec<&str> = parsed.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["created", "updated", "again"]);
        assert_eq!(parsed.get("created").and_then(|v| v.as_str()), Some("Sat, 05 Jan 2019 12:00:00 GMT"));
        assert_eq!(parsed.get("again").and_then(|v| v.as_str()), Some(RETAINED));
    }

    #[test]
    fn compute_sees_both_times_and_the_document() {
        let ctx = ServiceContext::with_ports(
            Box::new(FakeFs::default()),
            Box::new(FakeGit::with_history(&["2020-10-22T06:47:56+00:00"])),
        );
        let specs = FieldSpecs::new().with(
            "summary",
            FieldSpec::compute(|t| {
                Ok(format!("{} {} {}", t.document.path.display(), t.created_time, t.modified_time))
            }),
        );
        let mut root = Root::default();
        let mut doc = Document::new("a.md");

        transform(&mut root, &mut doc, &StampConfig::new(specs), &ctx).unwrap();
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(frontmatter(&root)).unwrap();
        assert_eq!(
            parsed.get("summary").and_then(|v| v.as_str()),
            Some(format!("a.md {RETAINED} {RETAINED}").as_str())
        );
    }

    #[test]
    fn toml_frontmatter_stays_toml() {
        let ctx = ServiceContext::with_ports(
            Box::new(FakeFs::default()),
            Box::new(FakeGit::with_history(&[])),
        );
        let mut root = Root::parse("+++\ntitle = \"Hello\"\n+++\nbody\n");
        let mut doc = Document::new("a.md");

        transform(&mut root, &mut doc, &StampConfig::new(FieldSpecs::new().with("foo", "bar")), &ctx)
            .unwrap();
        assert_eq!(locate(&root).unwrap().kind, MatterKind::Toml);
        assert_eq!(root.render(), "+++\ntitle = \"Hello\"\nfoo = \"bar\"\n+++\nbody\n");
    }

    #[test]
    fn compute_failure_aborts_without_touching_the_tree() {
        let ctx = ServiceContext::with_ports(
            Box::new(FakeFs::default()),
            Box::new(FakeGit::with_history(&[])),
        );
        let specs = FieldSpecs::new()
            .with("ok", "fine")
            .with("bad", FieldSpec::compute(|_| Err("division by zero".into())));
        let original = Root::parse("---\ntitle: Hi\n---\n");
        let mut root = original.clone();
        let mut doc = Document::new("a.md");

        let err = transform(&mut root, &mut doc, &StampConfig::new(specs), &ctx).unwrap_err();
        assert!(matches!(err, StampError::Compute { ref field, .. } if field == "bad"));
        assert_eq!(root, original);
    }

    #[test]
    fn malformed_frontmatter_aborts() {
        let ctx = ServiceContext::with_ports(
            Box::new(FakeFs::default()),
            Box::new(FakeGit::with_history(&[])),
        );
        let original = Root::parse("---\ntitle: [oops\n---\n");
        let mut root = original.clone();
        let mut doc = Document::new("a.md");

        let err = transform(&mut root, &mut doc, &StampConfig::default(), &ctx).unwrap_err();
        assert!(matches!(err, StampError::Frontmatter { .. }));
        assert_eq!(root, original);
    }
}
