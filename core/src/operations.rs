#![deny(missing_docs)]

//! # Patch Operations
//!
//! The declarative edits a plan is made of, and `apply`, which runs them in
//! order against a copy of the document.
//!
//! Operations never touch members they do not name. `apply` is all or
//! nothing: the caller only receives a document when every operation
//! succeeded.

use crate::document::Document;
use crate::error::{PatchError, PatchResult};
use crate::path::FieldPath;
use crate::servers::{rewrite_server_urls, ServerMatcher};
use crate::tags::{add_operation_tag, upsert_tags, Tag, TagPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// Top-level member holding the version-format marker.
pub const VERSION_MARKER_FIELD: &str = "openapi";

/// A single declarative edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum PatchOperation {
    /// Overwrites the value at a dotted path.
    SetScalarField {
        /// Dotted path, e.g. `info.version`.
        path: String,
        /// New value.
        value: Value,
    },

    /// Adds or updates entries of the top-level `tags` collection.
    UpsertTags {
        /// Incoming tags, in order.
        tags: Vec<Tag>,
        /// Replace the whole collection verbatim.
        #[serde(default)]
        replace: bool,
        /// Overrides the plan-wide tag policy.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<TagPolicy>,
    },

    /// Replaces the URL of matching `servers` entries.
    RewriteServerUrl {
        /// Substring (or regex with `regex: true`) selecting entries.
        matcher: String,
        /// Replacement URL.
        value: String,
        /// Treat `matcher` as a regular expression.
        #[serde(default)]
        regex: bool,
        /// Rewrite every match instead of the first; plan default when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        all: Option<bool>,
        /// New description for rewritten entries.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// Relabels the top-level `openapi` marker. No schema conversion happens.
    ConvertVersionMarker {
        /// Expected current marker; checked when present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        /// New marker.
        to: String,
    },

    /// Adds a tag name to one path operation.
    AddOperationTag {
        /// Key under `paths`, e.g. `/api/v1/hardware`.
        route: String,
        /// HTTP method (case-insensitive).
        method: String,
        /// Tag name to attach.
        tag: String,
    },
}

impl PatchOperation {
    /// Short human-readable description used in status lines and errors.
    pub fn describe(&self) -> String {
        match self {
            PatchOperation::SetScalarField { path, .. } => format!("set {}", path),
            PatchOperation::UpsertTags { tags, replace, .. } => {
                let verb = if *replace { "replace" } else { "upsert" };
                format!("{} tags ({})", verb, tags.len())
            }
            PatchOperation::RewriteServerUrl { matcher, .. } => {
                format!("rewrite servers matching '{}'", matcher)
            }
            PatchOperation::ConvertVersionMarker { to, .. } => {
                format!("convert {} marker to {}", VERSION_MARKER_FIELD, to)
            }
            PatchOperation::AddOperationTag { route, method, tag } => {
                format!("tag {} {} with '{}'", method.to_ascii_uppercase(), route, tag)
            }
        }
    }
}

/// Plan-wide defaults for the operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchOptions {
    /// Let `set_scalar_field` create missing intermediate objects.
    pub create_missing: bool,
    /// Policy for tags whose name already exists.
    pub tag_policy: TagPolicy,
    /// Default for `rewrite_server_url` when `all` is not given.
    pub rewrite_all_servers: bool,
}

/// The status of one completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Position of the operation in the list (0-based).
    pub index: usize,
    /// Operation description.
    pub operation: String,
    /// What changed.
    pub status: String,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.index + 1, self.operation, self.status)
    }
}

/// A patched document with one outcome per operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// The new document.
    pub document: Document,
    /// Status of each operation, in order.
    pub outcomes: Vec<Outcome>,
}

/// Applies `operations` in order to a copy of `doc`.
pub fn apply(
    doc: &Document,
    operations: &[PatchOperation],
    options: &PatchOptions,
) -> PatchResult<Applied> {
    apply_with(doc, operations, options, |_| {})
}

/// Like [`apply`], calling `on_outcome` as each operation completes.
pub fn apply_with(
    doc: &Document,
    operations: &[PatchOperation],
    options: &PatchOptions,
    mut on_outcome: impl FnMut(&Outcome),
) -> PatchResult<Applied> {
    let mut document = doc.clone();
    let mut outcomes = Vec::with_capacity(operations.len());

    for (index, op) in operations.iter().enumerate() {
        let operation = op.describe();
        log::debug!("Applying operation {}: {}", index + 1, operation);

        let status = apply_one(&mut document, op, options, &operation).map_err(|e| {
            log::error!("Operation {} ({}) failed: {}", index + 1, operation, e);
            e
        })?;

        let outcome = Outcome {
            index,
            operation,
            status,
        };
        on_outcome(&outcome);
        outcomes.push(outcome);
    }

    Ok(Applied { document, outcomes })
}

fn apply_one(
    doc: &mut Document,
    op: &PatchOperation,
    options: &PatchOptions,
    operation: &str,
) -> PatchResult<String> {
    let root = doc.as_map_mut();

    match op {
        PatchOperation::SetScalarField { path, value } => {
            let field = FieldPath::parse(path).map_err(|e| e.in_operation(operation))?;
            let previous = field.set(root, value.clone(), options.create_missing, operation)?;
            Ok(match previous {
                Some(old) if old == *value => format!("{} unchanged", value),
                Some(old) => format!("{} -> {}", old, value),
                None => format!("added {}", value),
            })
        }

        PatchOperation::UpsertTags {
            tags,
            replace,
            policy,
        } => {
            let report = upsert_tags(root, tags, policy.unwrap_or(options.tag_policy), *replace)?;
            if *replace {
                return Ok(format!("collection replaced, {} tags", report.total));
            }
            Ok(format!(
                "{} added, {} replaced, {} unchanged, {} total",
                report.added.len(),
                report.replaced.len(),
                report.unchanged.len(),
                report.total
            ))
        }

        PatchOperation::RewriteServerUrl {
            matcher,
            value,
            regex,
            all,
            description,
        } => {
            let selector = ServerMatcher::new(matcher, *regex, operation)?;
            let rewrites = rewrite_server_urls(
                root,
                &selector,
                value,
                description.as_deref(),
                all.unwrap_or(options.rewrite_all_servers),
                operation,
            )?;
            if rewrites.is_empty() {
                return Ok("no server matched".to_string());
            }
            let previous: Vec<&str> = rewrites.iter().map(|r| r.previous.as_str()).collect();
            Ok(format!("{} -> {}", previous.join(", "), value))
        }

        PatchOperation::ConvertVersionMarker { from, to } => {
            let current = root
                .get(VERSION_MARKER_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(expected) = from {
                if current.as_deref() != Some(expected.as_str()) {
                    return Err(PatchError::Precondition(format!(
                        "`{}` expected {} to be '{}', found {}",
                        operation,
                        VERSION_MARKER_FIELD,
                        expected,
                        current.as_deref().unwrap_or("nothing")
                    )));
                }
            }
            root.insert(VERSION_MARKER_FIELD.into(), Value::String(to.clone()));
            Ok(format!(
                "{} -> {}",
                current.as_deref().unwrap_or("(none)"),
                to
            ))
        }

        PatchOperation::AddOperationTag { route, method, tag } => {
            if add_operation_tag(root, route, method, tag, operation)? {
                Ok("added".to_string())
            } else {
                Ok("already present".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(
            json!({
                "openapi": "3.1.1",
                "info": { "title": "Proto API", "version": "1.4.1" },
                "servers": [{ "url": "https://virtserver.swaggerhub.com/mdk/1.4.1" }],
                "paths": { "/api/v1/hardware": { "get": { "tags": ["Hardware"] } } },
                "components": { "schemas": { "Fan": { "type": "object" } } }
            }),
            "test",
        )
        .unwrap()
    }

    fn set(path: &str, value: Value) -> PatchOperation {
        PatchOperation::SetScalarField {
            path: path.into(),
            value,
        }
    }

    #[test]
    fn test_apply_is_pure() {
        let original = doc();
        let applied = apply(
            &original,
            &[set("info.version", json!("1.5.0"))],
            &PatchOptions::default(),
        )
        .unwrap();

        assert_eq!(original.get("info.version"), Some(&json!("1.4.1")));
        assert_eq!(applied.document.get("info.version"), Some(&json!("1.5.0")));
        assert_eq!(applied.outcomes[0].status, r#""1.4.1" -> "1.5.0""#);
    }

    #[test]
    fn test_later_operations_see_earlier_ones() {
        let ops = vec![
            set("info.version", json!("1.5.0")),
            set("info.version", json!("1.7.2")),
        ];
        let applied = apply(&doc(), &ops, &PatchOptions::default()).unwrap();
        assert_eq!(applied.outcomes[1].status, r#""1.5.0" -> "1.7.2""#);
    }

    #[test]
    fn test_marker_guard() {
        let op = PatchOperation::ConvertVersionMarker {
            from: Some("3.0.0".into()),
            to: "3.0.3".into(),
        };
        let err = apply(&doc(), &[op], &PatchOptions::default()).unwrap_err();
        assert!(matches!(err, PatchError::Precondition(_)));

        let op = PatchOperation::ConvertVersionMarker {
            from: Some("3.1.1".into()),
            to: "3.0.3".into(),
        };
        let applied = apply(&doc(), &[op], &PatchOptions::default()).unwrap();
        assert_eq!(applied.document.get("openapi"), Some(&json!("3.0.3")));
        assert_eq!(applied.document.get("components"), doc().get("components"));
    }

    #[test]
    fn test_policy_override_per_operation() {
        let ops = vec![
            PatchOperation::UpsertTags {
                tags: vec![Tag::new("Fans", "v1")],
                replace: false,
                policy: None,
            },
            PatchOperation::UpsertTags {
                tags: vec![Tag::new("Fans", "v2")],
                replace: false,
                policy: Some(TagPolicy::Skip),
            },
        ];
        let applied = apply(&doc(), &ops, &PatchOptions::default()).unwrap();
        assert_eq!(applied.document.get("tags.0.description"), Some(&json!("v1")));
        assert_eq!(
            applied.outcomes[1].status,
            "0 added, 0 replaced, 1 unchanged, 1 total"
        );
    }

    #[test]
    fn test_rewrite_uses_plan_default() {
        let op = PatchOperation::RewriteServerUrl {
            matcher: "1.4.1".into(),
            value: "https://virtserver.swaggerhub.com/mdk/1.5.0".into(),
            regex: false,
            all: None,
            description: None,
        };
        let options = PatchOptions {
            rewrite_all_servers: true,
            ..PatchOptions::default()
        };
        let applied = apply(&doc(), &[op], &options).unwrap();
        assert_eq!(
            applied.document.get("servers.0.url"),
            Some(&json!("https://virtserver.swaggerhub.com/mdk/1.5.0"))
        );
    }

    #[test]
    fn test_failure_reports_callback_only_for_completed() {
        let ops = vec![
            set("info.version", json!("1.5.0")),
            set("nonexistent.nested.field", json!("x")),
        ];
        let mut seen = Vec::new();
        let err = apply_with(&doc(), &ops, &PatchOptions::default(), |o| {
            seen.push(o.operation.clone())
        })
        .unwrap_err();

        assert_eq!(seen, vec!["set info.version"]);
        match err {
            PatchError::Path {
                operation, segment, ..
            } => {
                assert_eq!(operation, "set nonexistent.nested.field");
                assert_eq!(segment, "nonexistent");
            }
            other => panic!("expected Path error, got {other}"),
        }
    }

    #[test]
    fn test_invalid_inputs_name_the_operation() {
        let err = apply(
            &doc(),
            &[set("info..version", json!("1.5.0"))],
            &PatchOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::Parse { .. }));
        assert!(err.to_string().contains("`set info..version` field path"));

        let rewrite = PatchOperation::RewriteServerUrl {
            matcher: "(unclosed".into(),
            value: "https://example.com".into(),
            regex: true,
            all: None,
            description: None,
        };
        match apply(&doc(), &[rewrite], &PatchOptions::default()).unwrap_err() {
            PatchError::Pattern { operation, message } => {
                assert_eq!(operation, "rewrite servers matching '(unclosed'");
                assert!(message.starts_with("'(unclosed'"));
            }
            other => panic!("expected Pattern error, got {other}"),
        }
    }

    #[test]
    fn test_operation_deserialization() {
        let op: PatchOperation = serde_json::from_value(json!({
            "op": "add_operation_tag",
            "route": "/api/v1/hardware",
            "method": "get",
            "tag": "Fans"
        }))
        .unwrap();
        assert_eq!(op.describe(), "tag GET /api/v1/hardware with 'Fans'");

        let bad = serde_json::from_value::<PatchOperation>(json!({
            "op": "set_scalar_field",
            "path": "info.version",
            "value": "1.5.0",
            "typo": true
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome {
            index: 0,
            operation: "set info.title".into(),
            status: "added \"Mining Development Kit API\"".into(),
        };
        assert_eq!(
            outcome.to_string(),
            "[1] set info.title: added \"Mining Development Kit API\""
        );
    }
}
