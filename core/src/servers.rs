#![deny(missing_docs)]

//! # Server URLs
//!
//! Rewrites entries of the top-level `servers` array whose `url` matches a
//! substring or regular expression.

use crate::error::{PatchError, PatchResult};
use regex::Regex;
use serde_json::{Map, Value};

/// Selects server entries by URL.
#[derive(Debug, Clone)]
pub enum ServerMatcher {
    /// Matches URLs containing the string.
    Substring(String),
    /// Matches URLs the expression finds a match in.
    Pattern(Regex),
}

impl ServerMatcher {
    /// Builds a matcher, compiling `matcher` when `regex` is set.
    /// `operation` names the failing operation in a `Pattern` error.
    pub fn new(matcher: &str, regex: bool, operation: &str) -> PatchResult<Self> {
        if regex {
            Regex::new(matcher)
                .map(ServerMatcher::Pattern)
                .map_err(|e| PatchError::Pattern {
                    operation: operation.to_string(),
                    message: format!("'{}': {}", matcher, e),
                })
        } else {
            Ok(ServerMatcher::Substring(matcher.to_string()))
        }
    }

    /// Returns `true` if `url` is selected.
    pub fn is_match(&self, url: &str) -> bool {
        match self {
            ServerMatcher::Substring(needle) => url.contains(needle.as_str()),
            ServerMatcher::Pattern(re) => re.is_match(url),
        }
    }
}

/// One rewritten server entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Position in the `servers` array.
    pub index: usize,
    /// URL before the rewrite.
    pub previous: String,
}

/// Replaces the URL of the first (or every, with `all`) matching server.
///
/// Entries without a string `url` are ignored. When `description` is given
/// it is written to every rewritten entry. A missing `servers` array is a
/// path error attributed to `operation`.
pub fn rewrite_server_urls(
    root: &mut Map<String, Value>,
    matcher: &ServerMatcher,
    new_url: &str,
    description: Option<&str>,
    all: bool,
    operation: &str,
) -> PatchResult<Vec<Rewrite>> {
    let servers = root
        .get_mut("servers")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| PatchError::path(operation, "servers", "servers"))?;

    let mut rewrites = Vec::new();

    for (index, server) in servers.iter_mut().enumerate() {
        let Some(entry) = server.as_object_mut() else {
            continue;
        };
        let previous = match entry.get("url").and_then(Value::as_str) {
            Some(url) if matcher.is_match(url) => url.to_string(),
            _ => continue,
        };

        entry.insert("url".into(), Value::String(new_url.to_string()));
        if let Some(text) = description {
            entry.insert("description".into(), Value::String(text.to_string()));
        }
        rewrites.push(Rewrite { index, previous });

        if !all {
            break;
        }
    }

    Ok(rewrites)
}
