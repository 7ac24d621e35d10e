//! Request fragments.
//!
//! # Responsibilities
//! - Hold the parts of an inbound request a grammar consumes (method, path
//!   segments, query map, body)
//! - Render a printed fragment back into a link (`/a/b?x=1`)
//!
//! # Design Decisions
//! - Path segments are percent-decoded on the way in and encoded on the way
//!   out, so captured values never see escape sequences
//! - Empty segments are dropped (`/episodes/` and `/episodes` are the same)
//! - The query map is ordered so printed links are deterministic

use std::collections::{BTreeMap, VecDeque};

use axum::body::Bytes;
use axum::http::Method;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// One inbound request, reduced to what route grammars look at.
///
/// Parsing consumes `path` and `query` destructively; a grammar matches only
/// when both are empty afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: VecDeque<String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl Request {
    /// An empty fragment: no segments, no query, no body.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path: VecDeque::new(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    /// Build a request from a raw (still percent-encoded) path and query string.
    pub fn from_parts(method: Method, path: &str, query: Option<&str>, body: Option<Bytes>) -> Self {
        let path = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();

        let query = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            path,
            query,
            body: body.filter(|b| !b.is_empty()),
        }
    }

    /// Parse a `path?query` link as a GET request.
    pub fn get(link: &str) -> Self {
        Self::with_method(Method::GET, link)
    }

    /// Parse a `path?query` link with the given method.
    pub fn with_method(method: Method, link: &str) -> Self {
        match link.split_once('?') {
            Some((path, query)) => Self::from_parts(method, path, Some(query), None),
            None => Self::from_parts(method, link, None, None),
        }
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = (!body.is_empty()).then_some(body);
        self
    }

    /// True once every path segment and query entry has been consumed.
    pub fn is_consumed(&self) -> bool {
        self.path.is_empty() && self.query.is_empty()
    }

    /// The encoded path, always starting with `/`.
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            out.push('/');
            out.extend(utf8_percent_encode(segment, SEGMENT));
        }
        out
    }

    /// The encoded query string, if there is anything to encode.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        Some(
            url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish(),
        )
    }

    /// Path plus query, ready to be used as an href or `Location`.
    pub fn link(&self) -> String {
        match self.query_string() {
            Some(query) => format!("{}?{}", self.path_string(), query),
            None => self.path_string(),
        }
    }

    /// Concatenate two printed fragments.
    ///
    /// Query keys must not collide; grammars are built so that each key is
    /// owned by exactly one combinator.
    pub(crate) fn merge(mut self, other: Request) -> Request {
        if other.method != Method::GET {
            self.method = other.method;
        }
        self.path.extend(other.path);
        for (key, value) in other.query {
            debug_assert!(
                !self.query.contains_key(&key),
                "query parameter `{key}` printed by two combinators"
            );
            self.query.entry(key).or_insert(value);
        }
        if self.body.is_none() {
            self.body = other.body;
        }
        self
    }
}
