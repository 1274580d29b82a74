//! Express-style path patterns.
//!
//! Supports:
//! - literal segments (`/users`)
//! - named parameters (`/users/:id`)
//! - a wildcard (`/files/*`, `/files/*/meta`), matching zero or more segments
//!
//! Captured parameter values are percent-decoded.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// Parameters captured from the request path, in pattern order.
///
/// Inserted into request extensions by the [`Dispatcher`](super::Dispatcher).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: BTreeMap<String, String>,
    order: Vec<String>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.params.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.params.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parameters in the order they appear in the pattern.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|name| self.params.get(name).map(|v| (name.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    Segment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
            trailing_slash: raw.len() > 1 && raw.ends_with('/'),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameters this pattern binds.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Match `path`.
    ///
    /// With `prefix`, the pattern only has to match the leading segments of
    /// `path`. With `strict`, a trailing slash on one side must be matched by
    /// the other.
    pub fn matches(
        &self,
        path: &str,
        prefix: bool,
        case_sensitive: bool,
        strict: bool,
    ) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = PathParams::new();
        if !match_segments(&self.segments, &parts, prefix, case_sensitive, &mut params) {
            return None;
        }
        if !prefix && strict && self.trailing_slash != (path.len() > 1 && path.ends_with('/')) {
            return None;
        }
        Some(params)
    }
}

/// Walk `segments` against `parts`; a wildcard backtracks over how many
/// parts it swallows, longest first.
fn match_segments(
    segments: &[Segment],
    parts: &[&str],
    prefix: bool,
    case_sensitive: bool,
    params: &mut PathParams,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return prefix || parts.is_empty();
    };
    match segment {
        Segment::Wildcard => (0..=parts.len()).rev().any(|taken| {
            let mut attempt = params.clone();
            let matched = match_segments(rest, &parts[taken..], prefix, case_sensitive, &mut attempt);
            if matched {
                *params = attempt;
            }
            matched
        }),
        Segment::Literal(literal) => {
            let Some((part, tail)) = parts.split_first() else {
                return false;
            };
            let equal = if case_sensitive {
                *part == literal.as_str()
            } else {
                part.eq_ignore_ascii_case(literal)
            };
            equal && match_segments(rest, tail, prefix, case_sensitive, params)
        }
        Segment::Param(name) => {
            let Some((part, tail)) = parts.split_first() else {
                return false;
            };
            params.insert(name.as_str(), decode(part));
            match_segments(rest, tail, prefix, case_sensitive, params)
        }
    }
}

/// Percent-decode a captured value; values that do not decode to UTF-8 are
/// kept as sent.
fn decode(part: &str) -> String {
    urlencoding::decode(part)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| part.to_string())
}
