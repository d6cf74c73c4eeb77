//! Route pattern compilation.
//!
//! # Syntax
//! ```text
//! /                 root (zero segments)
//! /posts            literal segment, compared exactly
//! /user/:id         named parameter, binds one non-empty segment
//! /user/:id/        trailing slash (only significant in strict mode)
//! ```
//!
//! # Design Decisions
//! - Patterns are compiled once, at registration time
//! - Every malformed pattern is rejected up front with a `PatternError`
//! - Parameter names follow identifier rules (`[A-Za-z_][A-Za-z0-9_]*`)

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Errors raised while compiling a route pattern or mount prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern {pattern:?} must start with '/'")]
    MissingLeadingSlash { pattern: String },

    #[error("pattern {pattern:?} has an empty segment at position {position}")]
    EmptySegment { pattern: String, position: usize },

    #[error("pattern {pattern:?} has an unnamed parameter at position {position}")]
    EmptyParamName { pattern: String, position: usize },

    #[error("pattern {pattern:?} has an invalid parameter name {name:?}")]
    InvalidParamName { pattern: String, name: String },

    #[error("pattern {pattern:?} binds parameter {name:?} more than once")]
    DuplicateParam { pattern: String, name: String },

    #[error("pattern {pattern:?} contains forbidden character {character:?}")]
    ForbiddenCharacter { pattern: String, character: char },
}

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Matches any non-empty request segment and binds it under this name.
    Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
    trailing_slash: bool,
}

const FORBIDDEN: [char; 2] = ['?', '#'];

impl Pattern {
    /// Compile a pattern such as `/user/:id`.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let rest = source
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash {
                pattern: source.to_string(),
            })?;

        if rest.is_empty() {
            return Ok(Self::root());
        }

        let (body, trailing_slash) = match rest.strip_suffix('/') {
            Some(body) => (body, true),
            None => (rest, false),
        };

        let segments = body
            .split('/')
            .enumerate()
            .map(|(position, raw)| parse_segment(source, position, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let pattern = Self {
            segments,
            trailing_slash,
        };
        pattern.check_unique_params(source)?;
        Ok(pattern)
    }

    /// The zero-segment pattern `/`.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            trailing_slash: false,
        }
    }

    /// Prefix `child` with `self`, as done when mounting a sub-router.
    ///
    /// `/user` joined with `/` is `/user`; joined with `/:id` it is `/user/:id`.
    pub fn join(&self, child: &Pattern) -> Result<Pattern, PatternError> {
        let mut segments = self.segments.clone();
        segments.extend(child.segments.iter().cloned());

        let trailing_slash = if child.segments.is_empty() {
            self.trailing_slash
        } else {
            child.trailing_slash
        };

        let joined = Pattern {
            segments,
            trailing_slash,
        };
        joined.check_unique_params(&joined.to_string())?;
        Ok(joined)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// Names of the parameters bound by this pattern, left to right.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    fn check_unique_params(&self, source: &str) -> Result<(), PatternError> {
        let mut seen = HashSet::new();
        for name in self.param_names() {
            if !seen.insert(name) {
                return Err(PatternError::DuplicateParam {
                    pattern: source.to_string(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => write!(f, "/{}", text)?,
                Segment::Param(name) => write!(f, "/:{}", name)?,
            }
        }
        if self.trailing_slash {
            f.write_str("/")?;
        }
        Ok(())
    }
}

fn parse_segment(source: &str, position: usize, raw: &str) -> Result<Segment, PatternError> {
    if raw.is_empty() {
        return Err(PatternError::EmptySegment {
            pattern: source.to_string(),
            position,
        });
    }

    if let Some(character) = raw.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(PatternError::ForbiddenCharacter {
            pattern: source.to_string(),
            character,
        });
    }

    match raw.strip_prefix(':') {
        Some("") => Err(PatternError::EmptyParamName {
            pattern: source.to_string(),
            position,
        }),
        Some(name) if is_identifier(name) => Ok(Segment::Param(name.to_string())),
        Some(name) => Err(PatternError::InvalidParamName {
            pattern: source.to_string(),
            name: name.to_string(),
        }),
        None => Ok(Segment::Literal(raw.to_string())),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
