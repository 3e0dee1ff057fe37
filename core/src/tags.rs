#![deny(missing_docs)]

//! # Tag Metadata
//!
//! Upserts the top-level `tags` collection and attaches tag names to
//! individual path operations.

use crate::error::{PatchError, PatchResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named grouping of operations with a human-readable description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique name within the collection.
    pub name: String,
    /// Description shown by documentation tooling.
    pub description: String,
    /// Any other members (`externalDocs`, `x-*`), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tag {
    /// Creates a tag with no extra members.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }

    /// Renders the tag as a JSON object, `name` and `description` first.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("description".into(), Value::String(self.description.clone()));
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

/// What happens when an incoming tag's name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPolicy {
    /// Overwrite the existing description in place.
    #[default]
    Replace,
    /// Leave the existing tag untouched.
    Skip,
}

/// Summary of a tag upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    /// Names appended to the collection.
    pub added: Vec<String>,
    /// Names whose description was replaced.
    pub replaced: Vec<String>,
    /// Names left alone (policy `skip`, or description already equal).
    pub unchanged: Vec<String>,
    /// Collection length after the upsert.
    pub total: usize,
}

/// Upserts `tags` into the document's top-level `tags` array.
///
/// With `replace_all` the whole collection is replaced verbatim; otherwise
/// the collection only grows. A missing `tags` member is created.
pub fn upsert_tags(
    root: &mut Map<String, Value>,
    tags: &[Tag],
    policy: TagPolicy,
    replace_all: bool,
) -> PatchResult<TagReport> {
    if replace_all {
        let collection: Vec<Value> = tags.iter().map(Tag::to_value).collect();
        let report = TagReport {
            added: tags.iter().map(|t| t.name.clone()).collect(),
            total: collection.len(),
            ..TagReport::default()
        };
        root.insert("tags".into(), Value::Array(collection));
        return Ok(report);
    }

    let existing = root
        .entry("tags")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| PatchError::Precondition("top-level `tags` is not an array".into()))?;

    let mut positions: IndexMap<String, usize> = existing
        .iter()
        .enumerate()
        .filter_map(|(idx, tag)| {
            tag.get("name")
                .and_then(Value::as_str)
                .map(|name| (name.to_string(), idx))
        })
        .collect();

    let mut report = TagReport::default();

    for tag in tags {
        match positions.get(&tag.name) {
            Some(&idx) => {
                let current = existing[idx].get("description").and_then(Value::as_str);
                if policy == TagPolicy::Skip || current == Some(tag.description.as_str()) {
                    report.unchanged.push(tag.name.clone());
                    continue;
                }
                if let Some(obj) = existing[idx].as_object_mut() {
                    obj.insert(
                        "description".into(),
                        Value::String(tag.description.clone()),
                    );
                }
                report.replaced.push(tag.name.clone());
            }
            None => {
                positions.insert(tag.name.clone(), existing.len());
                existing.push(tag.to_value());
                report.added.push(tag.name.clone());
            }
        }
    }

    report.total = existing.len();
    Ok(report)
}

/// Adds `tag` to `paths.<route>.<method>.tags` unless already present.
///
/// Returns `true` when the tag was added. `operation` names the caller in
/// path errors.
pub fn add_operation_tag(
    root: &mut Map<String, Value>,
    route: &str,
    method: &str,
    tag: &str,
    operation: &str,
) -> PatchResult<bool> {
    let method = method.to_ascii_lowercase();
    let full_path = format!("paths.{}.{}.tags", route, method);
    let missing = |segment: &str| PatchError::path(operation, full_path.as_str(), segment);

    let op = root
        .get_mut("paths")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| missing("paths"))?
        .get_mut(route)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| missing(route))?
        .get_mut(&method)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| missing(method.as_str()))?;

    let tags = op
        .entry("tags")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| {
            PatchError::Precondition(format!("`tags` of {} {} is not an array", method, route))
        })?;

    if tags.iter().any(|t| t.as_str() == Some(tag)) {
        return Ok(false);
    }
    tags.push(Value::String(tag.to_string()));
    Ok(true)
}
