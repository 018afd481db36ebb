//! Resource patterns and path matching.
//!
//! A pattern is either the universal pattern `*` or an absolute path whose
//! segments are literals, named parameters (`:id`) or single-segment
//! wildcards (`*`). Parameters and wildcards match exactly one non-empty
//! segment, never several. Literals compare case-sensitively. Trailing
//! slashes are dropped on both sides before comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthzError, Result};

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Literal(String),
    /// `:name`
    Param(String),
    /// `*` inside a path
    Wildcard,
}

impl Segment {
    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Param(_) | Segment::Wildcard => !segment.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum PatternKind {
    Universal,
    Path(Vec<Segment>),
}

/// A validated resource pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePattern {
    raw: String,
    kind: PatternKind,
}

impl ResourcePattern {
    /// The pattern matching every resource.
    pub fn universal() -> Self {
        Self {
            raw: "*".to_string(),
            kind: PatternKind::Universal,
        }
    }

    /// Parses a pattern, rejecting anything the matcher could not interpret.
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(AuthzError::invalid_pattern(pattern, "pattern cannot be empty"));
        }
        if trimmed == "*" {
            return Ok(Self::universal());
        }
        if !trimmed.starts_with('/') {
            return Err(AuthzError::invalid_pattern(
                pattern,
                "pattern must be '*' or start with '/'",
            ));
        }

        let normalized = trimmed.trim_end_matches('/');
        if normalized.is_empty() {
            return Ok(Self {
                raw: "/".to_string(),
                kind: PatternKind::Path(Vec::new()),
            });
        }

        let segments = normalized[1..]
            .split('/')
            .map(|segment| parse_segment(pattern, segment))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: normalized.to_string(),
            kind: PatternKind::Path(segments),
        })
    }

    /// The normalized pattern text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_universal(&self) -> bool {
        self.kind == PatternKind::Universal
    }

    /// Path segments, or `None` for the universal pattern.
    pub fn segments(&self) -> Option<&[Segment]> {
        match &self.kind {
            PatternKind::Universal => None,
            PatternKind::Path(segments) => Some(segments),
        }
    }

    /// Matches a raw request path. Malformed paths never match.
    pub fn matches(&self, path: &str) -> bool {
        match split_request_path(path) {
            Some(segments) => self.matches_segments(&segments),
            None => false,
        }
    }

    /// Matches a path already split by [`split_request_path`].
    pub fn matches_segments(&self, path: &[&str]) -> bool {
        match &self.kind {
            PatternKind::Universal => true,
            PatternKind::Path(segments) => {
                segments.len() == path.len()
                    && segments
                        .iter()
                        .zip(path)
                        .all(|(segment, actual)| segment.matches(actual))
            }
        }
    }
}

impl TryFrom<String> for ResourcePattern {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResourcePattern> for String {
    fn from(pattern: ResourcePattern) -> Self {
        pattern.raw
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits an absolute request path into segments, dropping trailing slashes.
///
/// Returns `None` for paths that are empty, relative, or contain an empty
/// interior segment (`/api//users`).
pub fn split_request_path(path: &str) -> Option<Vec<&str>> {
    if !path.starts_with('/') {
        return None;
    }
    let normalized = path.trim_end_matches('/');
    if normalized.is_empty() {
        return Some(Vec::new());
    }
    let segments: Vec<&str> = normalized[1..].split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return None;
    }
    Some(segments)
}

fn parse_segment(pattern: &str, segment: &str) -> Result<Segment> {
    if segment.is_empty() {
        return Err(AuthzError::invalid_pattern(pattern, "empty path segment"));
    }
    if segment == "*" {
        return Ok(Segment::Wildcard);
    }
    if let Some(name) = segment.strip_prefix(':') {
        if name.is_empty() {
            return Err(AuthzError::invalid_pattern(pattern, "parameter needs a name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AuthzError::invalid_pattern(
                pattern,
                format!("invalid parameter name ':{name}'"),
            ));
        }
        return Ok(Segment::Param(name.to_string()));
    }
    if segment.contains('*') {
        return Err(AuthzError::invalid_pattern(
            pattern,
            "wildcard must be a whole segment",
        ));
    }
    Ok(Segment::Literal(segment.to_string()))
}
