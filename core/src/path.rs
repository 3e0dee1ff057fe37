#![deny(missing_docs)]

//! # Field Paths
//!
//! Dotted paths into a JSON document (`info.version`, `servers.0.url`).
//!
//! - Object members are addressed by key; `\.` escapes a literal dot and
//!   `\\` a literal backslash.
//! - Numeric segments index into arrays. Indices are never created.

use crate::error::{PatchError, PatchResult};
use serde_json::{Map, Value};
use std::fmt::Display;

/// A parsed dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

/// Error context threaded through the recursive setters.
struct Target<'a> {
    operation: &'a str,
    path: &'a str,
    create_missing: bool,
}

impl Target<'_> {
    fn missing(&self, segment: &str) -> PatchError {
        PatchError::path(self.operation, self.path, segment)
    }
}

impl FieldPath {
    /// Parses a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(raw: &str) -> PatchResult<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped @ ('.' | '\\')) => current.push(escaped),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => current.push('\\'),
                },
                '.' => segments.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        segments.push(current);

        if segments.iter().any(String::is_empty) {
            return Err(PatchError::parse(
                "field path",
                format!("'{}' contains an empty segment", raw),
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The unescaped segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Reads the value at this path, if present.
    pub fn get<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = root.get(first)?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at this path and returns the value it replaced.
    ///
    /// Missing intermediate objects are created only when `create_missing`
    /// is set; otherwise the first absent segment is reported as a
    /// `PatchError::Path` attributed to `operation`.
    pub fn set(
        &self,
        root: &mut Map<String, Value>,
        value: Value,
        create_missing: bool,
        operation: &str,
    ) -> PatchResult<Option<Value>> {
        let target = Target {
            operation,
            path: &self.raw,
            create_missing,
        };
        set_in_map(root, &self.segments, value, &target)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn set_in_map(
    map: &mut Map<String, Value>,
    segments: &[String],
    value: Value,
    target: &Target<'_>,
) -> PatchResult<Option<Value>> {
    match segments {
        [] => Err(target.missing("")),
        [last] => Ok(map.insert(last.clone(), value)),
        [head, rest @ ..] => {
            let child = if target.create_missing {
                map.entry(head.clone())
                    .or_insert_with(|| Value::Object(Map::new()))
            } else {
                map.get_mut(head).ok_or_else(|| target.missing(head))?
            };
            set_in_value(child, rest, value, target)
        }
    }
}

fn set_in_value(
    current: &mut Value,
    segments: &[String],
    value: Value,
    target: &Target<'_>,
) -> PatchResult<Option<Value>> {
    match current {
        Value::Object(map) => set_in_map(map, segments, value, target),
        Value::Array(items) => set_in_array(items, segments, value, target),
        // A scalar sits where a container is needed.
        _ => Err(target.missing(segments.first().map(String::as_str).unwrap_or(""))),
    }
}

fn set_in_array(
    items: &mut [Value],
    segments: &[String],
    value: Value,
    target: &Target<'_>,
) -> PatchResult<Option<Value>> {
    let (head, rest) = segments.split_first().ok_or_else(|| target.missing(""))?;
    let slot = head
        .parse::<usize>()
        .ok()
        .and_then(|idx| items.get_mut(idx))
        .ok_or_else(|| target.missing(head))?;

    if rest.is_empty() {
        Ok(Some(std::mem::replace(slot, value)))
    } else {
        set_in_value(slot, rest, value, target)
    }
}
