//! Structural descriptions of grammars and the site map derived from them.
//!
//! A `Description` mirrors how a grammar was assembled. It carries no
//! behavior; `routes()` flattens it into one entry per reachable endpoint.

use std::fmt;

use serde::Serialize;

/// Structural dump of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Description {
    Empty,
    Method(String),
    Constant(String),
    Capture { kind: &'static str },
    Query { name: String, kind: &'static str, required: bool },
    Sequence(Vec<Description>),
    Choice(Vec<Description>),
}

impl Description {
    /// Sequence two descriptions, flattening nested sequences and dropping empties.
    pub fn then(self, other: Description) -> Description {
        let mut parts = Vec::new();
        for d in [self, other] {
            match d {
                Description::Empty => {}
                Description::Sequence(inner) => parts.extend(inner),
                d => parts.push(d),
            }
        }
        match parts.len() {
            0 => Description::Empty,
            1 => parts.remove(0),
            _ => Description::Sequence(parts),
        }
    }

    /// One entry per route reachable through this grammar.
    pub fn routes(&self) -> Vec<RouteDescription> {
        let mut out = Vec::new();
        for branch in self.branches() {
            let mut route = RouteDescription::default();
            for part in branch {
                match part {
                    Description::Method(m) => route.method = m.clone(),
                    Description::Constant(c) => route.path.push(Segment::Constant(c.clone())),
                    Description::Capture { kind } => route.path.push(Segment::Parameter(kind)),
                    Description::Query { name, kind, required } => route.query.push(QueryDescription {
                        name: name.clone(),
                        kind,
                        required: *required,
                    }),
                    _ => {}
                }
            }
            out.push(route);
        }
        out
    }

    /// Expand choices into the flat leaf sequences they can produce.
    fn branches(&self) -> Vec<Vec<&Description>> {
        match self {
            Description::Empty => vec![Vec::new()],
            Description::Choice(alternatives) => alternatives.iter().flat_map(|a| a.branches()).collect(),
            Description::Sequence(parts) => {
                let mut acc: Vec<Vec<&Description>> = vec![Vec::new()];
                for part in parts {
                    let tails = part.branches();
                    acc = acc
                        .into_iter()
                        .flat_map(|head| {
                            tails.iter().map(move |tail| {
                                let mut joined = head.clone();
                                joined.extend(tail.iter().copied());
                                joined
                            })
                        })
                        .collect();
                }
                acc
            }
            leaf => vec![vec![leaf]],
        }
    }
}

/// A path segment in the site map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Constant(String),
    Parameter(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDescription {
    pub name: String,
    pub kind: &'static str,
    pub required: bool,
}

/// A single site map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescription {
    pub method: String,
    pub path: Vec<Segment>,
    pub query: Vec<QueryDescription>,
}

impl Default for RouteDescription {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: Vec::new(),
            query: Vec::new(),
        }
    }
}

impl fmt::Display for RouteDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.method)?;
        if self.path.is_empty() {
            write!(f, "/")?;
        }
        for segment in &self.path {
            match segment {
                Segment::Constant(c) => write!(f, "/{c}")?,
                Segment::Parameter(kind) => write!(f, "/:{kind}")?,
            }
        }
        for (i, q) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            let marker = if q.required { "" } else { "?" };
            write!(f, "{sep}{}={}{marker}", q.name, q.kind)?;
        }
        Ok(())
    }
}
