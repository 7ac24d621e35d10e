//! Bidirectional route grammars.
//!
//! # Responsibilities
//! - Parse a `Request` fragment into a typed value
//! - Print a typed value back into a `Request` fragment (a link)
//! - Compose grammars: sequence, transform, choice
//!
//! # Design Decisions
//! - A grammar is immutable once built; clones share the same closures
//! - `print` is a left inverse of `parse`: `parse(print(a)) == Some(a)`
//! - `choice` works on a copy of the request per alternative and only commits
//!   an alternative that consumed the whole request
//! - First match wins, in declaration order

use std::fmt;
use std::sync::Arc;

use crate::routing::description::Description;
use crate::routing::request::Request;

type ParseFn<A> = dyn Fn(&mut Request) -> Option<A> + Send + Sync;
type PrintFn<A> = dyn Fn(&A) -> Option<Request> + Send + Sync;

/// A two-way mapping between request fragments and values of `A`.
pub struct Router<A> {
    parse: Arc<ParseFn<A>>,
    print: Arc<PrintFn<A>>,
    description: Description,
}

impl<A> Clone for Router<A> {
    fn clone(&self) -> Self {
        Self {
            parse: self.parse.clone(),
            print: self.print.clone(),
            description: self.description.clone(),
        }
    }
}

impl<A> fmt::Debug for Router<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("description", &self.description).finish()
    }
}

impl<A: 'static> Router<A> {
    /// Build a grammar from raw parse/print functions.
    pub fn new<P, Q>(parse: P, print: Q, description: Description) -> Self
    where
        P: Fn(&mut Request) -> Option<A> + Send + Sync + 'static,
        Q: Fn(&A) -> Option<Request> + Send + Sync + 'static,
    {
        Self {
            parse: Arc::new(parse),
            print: Arc::new(print),
            description,
        }
    }

    /// Consume a prefix of `request`, producing a value.
    ///
    /// The request is left partially consumed on failure; callers that need
    /// to retry work on a copy.
    pub fn parse(&self, request: &mut Request) -> Option<A> {
        (self.parse)(request)
    }

    /// Print `value` as a fresh request fragment.
    ///
    /// `None` means no part of this grammar handles the value (for example a
    /// different enum case).
    pub fn print(&self, value: &A) -> Option<Request> {
        (self.print)(value)
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Match a whole request: parse a copy and require full consumption.
    pub fn match_request(&self, request: &Request) -> Option<A> {
        let mut scratch = request.clone();
        let value = self.parse(&mut scratch)?;
        scratch.is_consumed().then_some(value)
    }

    /// The link (`path?query`) for `value`.
    pub fn path_for(&self, value: &A) -> Option<String> {
        self.print(value).map(|request| request.link())
    }

    /// Sequence with another grammar, pairing results.
    pub fn and<B: 'static>(self, other: Router<B>) -> Router<(A, B)> {
        sequence(self, other)
    }

    /// Sequence with a grammar that carries no value.
    pub fn skip(self, other: Router<()>) -> Router<A> {
        let (pa, pb) = (self.parse.clone(), other.parse.clone());
        let (qa, qb) = (self.print.clone(), other.print.clone());
        Router::new(
            move |req| {
                let a = pa(req)?;
                pb(req)?;
                Some(a)
            },
            move |a| Some(qa(a)?.merge(qb(&())?)),
            self.description.then(other.description),
        )
    }

    /// Lift through a partial isomorphism with a total inverse.
    pub fn map<B, T, F>(self, to: T, from: F) -> Router<B>
    where
        B: 'static,
        T: Fn(A) -> Option<B> + Send + Sync + 'static,
        F: Fn(&B) -> A + Send + Sync + 'static,
    {
        transform(self, to, from)
    }

    /// Lift into one case of a sum type.
    ///
    /// Like `map`, but `from` returns `None` for values of other cases so that
    /// printing through a `choice` falls through to the right alternative.
    pub fn variant<B, T, F>(self, to: T, from: F) -> Router<B>
    where
        B: 'static,
        T: Fn(A) -> Option<B> + Send + Sync + 'static,
        F: Fn(&B) -> Option<A> + Send + Sync + 'static,
    {
        let (parse, print) = (self.parse, self.print);
        Router::new(
            move |req| parse(req).and_then(&to),
            move |b| print(&from(b)?),
            self.description,
        )
    }
}

impl Router<()> {
    /// Sequence, keeping only the right-hand value.
    pub fn then<B: 'static>(self, other: Router<B>) -> Router<B> {
        let (pa, pb) = (self.parse.clone(), other.parse.clone());
        let (qa, qb) = (self.print.clone(), other.print.clone());
        Router::new(
            move |req| {
                pa(req)?;
                pb(req)
            },
            move |b| Some(qa(&())?.merge(qb(b)?)),
            self.description.then(other.description),
        )
    }

    /// Attach a constant value to a grammar that carries none.
    pub fn to<B>(self, value: B) -> Router<B>
    where
        B: Clone + PartialEq + Send + Sync + 'static,
    {
        let expected = value.clone();
        self.variant(move |()| Some(value.clone()), move |b| (*b == expected).then_some(()))
    }
}

/// Run `a` then `b` against the same request.
pub fn sequence<A: 'static, B: 'static>(a: Router<A>, b: Router<B>) -> Router<(A, B)> {
    let (pa, pb) = (a.parse, b.parse);
    let (qa, qb) = (a.print, b.print);
    Router::new(
        move |req| {
            let left = pa(req)?;
            let right = pb(req)?;
            Some((left, right))
        },
        move |(left, right)| Some(qa(left)?.merge(qb(right)?)),
        a.description.then(b.description),
    )
}

/// Lift a grammar for `A` into one for `B`.
///
/// `to` may reject (malformed values parse as a miss); `from` must be total.
pub fn transform<A, B, T, F>(g: Router<A>, to: T, from: F) -> Router<B>
where
    A: 'static,
    B: 'static,
    T: Fn(A) -> Option<B> + Send + Sync + 'static,
    F: Fn(&B) -> A + Send + Sync + 'static,
{
    let (parse, print) = (g.parse, g.print);
    Router::new(
        move |req| parse(req).and_then(&to),
        move |b| print(&from(b)),
        g.description,
    )
}

/// Try alternatives in order; the first that parses and consumes the whole
/// request wins.
///
/// Printing uses the first alternative that can print the value.
pub fn choice<A: 'static>(alternatives: Vec<Router<A>>) -> Router<A> {
    let description = Description::Choice(alternatives.iter().map(|r| r.description.clone()).collect());
    let alternatives = Arc::new(alternatives);
    let printers = alternatives.clone();
    Router::new(
        move |req| {
            for alternative in alternatives.iter() {
                let mut scratch = req.clone();
                if let Some(value) = alternative.parse(&mut scratch) {
                    if scratch.is_consumed() {
                        *req = scratch;
                        return Some(value);
                    }
                }
            }
            None
        },
        move |value| printers.iter().find_map(|alternative| alternative.print(value)),
        description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::{capture, constant, method, optional_query_param};
    use axum::http::Method;

    #[derive(Debug, Clone, PartialEq)]
    enum Page {
        Episode { id: u32, t: Option<u32> },
        Latest,
        ById(u32),
    }

    fn episode() -> Router<(u32, Option<u32>)> {
        constant("episodes").then(capture::<u32>()).and(optional_query_param::<u32>("t"))
    }

    #[test]
    fn test_episode_prints_without_query() {
        let link = episode().path_for(&(42, None));
        assert_eq!(link.as_deref(), Some("/episodes/42"));
    }

    #[test]
    fn test_episode_parses_optional_query() {
        let parsed = episode().match_request(&Request::get("/episodes/42?t=90"));
        assert_eq!(parsed, Some((42, Some(90))));
    }

    #[test]
    fn test_extra_segment_is_not_consumed() {
        assert_eq!(episode().match_request(&Request::get("/episodes/42/extra")), None);
        assert_eq!(episode().match_request(&Request::get("/episodes/42?x=1")), None);
    }

    #[test]
    fn test_transform_rejection_is_a_miss() {
        let even = capture::<u32>().map(|n| (n % 2 == 0).then_some(n), |n| *n);
        assert_eq!(even.match_request(&Request::get("/4")), Some(4));
        assert_eq!(even.match_request(&Request::get("/3")), None);
    }

    #[test]
    fn test_choice_requires_full_consumption() {
        let router = choice(vec![
            constant("episodes").to(Page::Latest),
            episode().variant(
                |(id, t)| Some(Page::Episode { id, t }),
                |p| match p {
                    Page::Episode { id, t } => Some((*id, *t)),
                    _ => None,
                },
            ),
        ]);
        // The first alternative parses `/episodes` but leaves `42` behind.
        assert_eq!(
            router.match_request(&Request::get("/episodes/42")),
            Some(Page::Episode { id: 42, t: None })
        );
        assert_eq!(router.match_request(&Request::get("/episodes")), Some(Page::Latest));
        assert_eq!(router.path_for(&Page::Latest).as_deref(), Some("/episodes"));
    }

    #[test]
    fn test_choice_first_match_wins() {
        let by_id = |tag: &'static str| {
            constant("e").then(capture::<u32>()).variant(
                move |n| Some(if tag == "first" { Page::ById(n) } else { Page::Episode { id: n, t: None } }),
                |p| match p {
                    Page::ById(n) => Some(*n),
                    _ => None,
                },
            )
        };
        let forward = choice(vec![by_id("first"), by_id("second")]);
        let reversed = choice(vec![by_id("second"), by_id("first")]);
        assert_eq!(forward.match_request(&Request::get("/e/7")), Some(Page::ById(7)));
        assert_eq!(
            reversed.match_request(&Request::get("/e/7")),
            Some(Page::Episode { id: 7, t: None })
        );
    }

    #[test]
    fn test_choice_does_not_leak_partial_consumption() {
        let router = choice(vec![
            constant("a").then(constant("b")).to(1u8),
            constant("a").to(2u8),
        ]);
        let mut req = Request::get("/a");
        assert_eq!(router.parse(&mut req), Some(2));
        assert!(req.is_consumed());

        let mut miss = Request::get("/z");
        assert_eq!(router.parse(&mut miss), None);
        assert_eq!(miss.path.len(), 1);
    }

    #[test]
    fn test_method_distinguishes_alternatives() {
        let router = choice(vec![
            method(Method::GET).then(constant("account")).to("show"),
            method(Method::POST).then(constant("account")).to("update"),
        ]);
        let post = Request::with_method(Method::POST, "/account");
        assert_eq!(router.match_request(&post), Some("update"));
        assert_eq!(router.print(&"update").map(|r| r.method), Some(Method::POST));
        assert_eq!(router.match_request(&Request::with_method(Method::PUT, "/account")), None);
    }

    #[test]
    fn test_skip_keeps_left_value() {
        let router = capture::<u32>().skip(constant("edit"));
        assert_eq!(router.match_request(&Request::get("/9/edit")), Some(9));
        assert_eq!(router.path_for(&9).as_deref(), Some("/9/edit"));
    }
}
