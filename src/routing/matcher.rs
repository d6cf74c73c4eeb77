//! Request path matching.
//!
//! # Responsibilities
//! - Split a request path into `/`-delimited segments
//! - Compare segments against a compiled `Pattern`
//! - Bind parameter values for a successful match
//!
//! # Design Decisions
//! - Literal comparison is exact and case-sensitive
//! - Segments are matched raw; no percent-decoding
//! - Empty segments (`/a//b`) never match anything
//! - No regex, matching is O(segments)

use crate::routing::params::Params;
use crate::routing::pattern::{Pattern, Segment};

/// How a trailing slash on patterns and request paths is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSlash {
    /// `/user` and `/user/` are the same path.
    #[default]
    Ignore,
    /// `/user` and `/user/` are different paths.
    Strict,
}

/// A request path split into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath<'a> {
    segments: Vec<&'a str>,
    trailing_slash: bool,
}

impl<'a> RequestPath<'a> {
    /// Split `path`. Returns `None` when it does not start with `/`.
    pub fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        if rest.is_empty() {
            return Some(Self {
                segments: Vec::new(),
                trailing_slash: false,
            });
        }

        let (body, trailing_slash) = match rest.strip_suffix('/') {
            Some(body) => (body, true),
            None => (rest, false),
        };

        Some(Self {
            segments: body.split('/').collect(),
            trailing_slash,
        })
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    pub fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }
}

impl Pattern {
    /// Returns true if `path` matches this pattern segment by segment.
    pub fn is_match(&self, path: &RequestPath<'_>, mode: TrailingSlash) -> bool {
        if self.segments().len() != path.segments().len() {
            return false;
        }
        if mode == TrailingSlash::Strict && self.trailing_slash() != path.trailing_slash() {
            return false;
        }

        self.segments()
            .iter()
            .zip(path.segments())
            .all(|(segment, input)| match segment {
                Segment::Literal(text) => text == input,
                Segment::Param(_) => !input.is_empty(),
            })
    }

    /// Bind parameter values from a path that already passed `is_match`.
    pub fn bind(&self, path: &RequestPath<'_>) -> Params {
        let mut params = Params::new();
        for (segment, input) in self.segments().iter().zip(path.segments()) {
            if let Segment::Param(name) = segment {
                params.push(name.clone(), (*input).to_string());
            }
        }
        params
    }
}
