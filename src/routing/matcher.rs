//! Primitive grammars.
//!
//! # Responsibilities
//! - Match the request method
//! - Match literal path segments
//! - Capture typed path segments
//! - Read typed query parameters (required or optional)
//!
//! # Design Decisions
//! - Every primitive consumes at most what it recognises
//! - Method matching consumes nothing; full consumption only looks at path
//!   and query
//! - An optional query parameter that is present but malformed is a miss,
//!   not `None`
//! - A value without a parseable rendering prints nothing, never a dead link

use axum::http::Method;

use crate::routing::description::Description;
use crate::routing::params::Param;
use crate::routing::request::Request;
use crate::routing::router::Router;

/// Matches nothing and prints nothing.
pub fn empty() -> Router<()> {
    Router::new(|_| Some(()), |_| Some(Request::new(Method::GET)), Description::Empty)
}

/// Requires the request method to be `expected`.
pub fn method(expected: Method) -> Router<()> {
    let printed = expected.clone();
    let description = Description::Method(expected.as_str().to_string());
    Router::new(
        move |req| (req.method == expected).then_some(()),
        move |_| Some(Request::new(printed.clone())),
        description,
    )
}

/// Consumes one literal path segment.
pub fn constant(segment: impl Into<String>) -> Router<()> {
    let segment = segment.into();
    let printed = segment.clone();
    let description = Description::Constant(segment.clone());
    Router::new(
        move |req| {
            if req.path.front() == Some(&segment) {
                req.path.pop_front();
                Some(())
            } else {
                None
            }
        },
        move |_| {
            let mut out = Request::new(Method::GET);
            out.path.push_back(printed.clone());
            Some(out)
        },
        description,
    )
}

/// Consumes one path segment and converts it to `T`.
pub fn capture<T>() -> Router<T>
where
    T: Param + 'static,
{
    Router::new(
        |req| {
            let value = T::parse(req.path.front()?)?;
            req.path.pop_front();
            Some(value)
        },
        |value: &T| {
            let mut out = Request::new(Method::GET);
            out.path.push_back(value.render()?);
            Some(out)
        },
        Description::Capture { kind: T::KIND },
    )
}

/// Reads and removes a required query parameter.
pub fn query_param<T>(name: impl Into<String>) -> Router<T>
where
    T: Param + 'static,
{
    let name = name.into();
    let key = name.clone();
    let description = Description::Query {
        name: name.clone(),
        kind: T::KIND,
        required: true,
    };
    Router::new(
        move |req| {
            let value = T::parse(req.query.get(&name)?)?;
            req.query.remove(&name);
            Some(value)
        },
        move |value: &T| {
            let mut out = Request::new(Method::GET);
            out.query.insert(key.clone(), value.render()?);
            Some(out)
        },
        description,
    )
}

/// Reads and removes an optional query parameter.
pub fn optional_query_param<T>(name: impl Into<String>) -> Router<Option<T>>
where
    T: Param + 'static,
{
    let name = name.into();
    let key = name.clone();
    let description = Description::Query {
        name: name.clone(),
        kind: T::KIND,
        required: false,
    };
    Router::new(
        move |req| match req.query.get(&name) {
            None => Some(None),
            Some(raw) => {
                let value = T::parse(raw)?;
                req.query.remove(&name);
                Some(Some(value))
            }
        },
        move |value: &Option<T>| {
            let mut out = Request::new(Method::GET);
            if let Some(v) = value {
                out.query.insert(key.clone(), v.render()?);
            }
            Some(out)
        },
        description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_constant_mismatch_leaves_request_alone() {
        let mut req = Request::get("/other");
        assert_eq!(constant("episodes").parse(&mut req), None);
        assert_eq!(req.path.len(), 1);
    }

    #[test]
    fn test_capture_uuid() {
        let id = Uuid::new_v4();
        let router = constant("gifts").then(capture::<Uuid>());
        let link = router.path_for(&id).unwrap();
        assert_eq!(link, format!("/gifts/{id}"));
        assert_eq!(router.match_request(&Request::get(&link)), Some(id));
        assert_eq!(router.match_request(&Request::get("/gifts/nope")), None);
    }

    #[test]
    fn test_required_query_param() {
        let router = constant("login").then(query_param::<String>("code"));
        assert_eq!(router.match_request(&Request::get("/login?code=abc")), Some("abc".to_string()));
        assert_eq!(router.match_request(&Request::get("/login")), None);
    }

    #[test]
    fn test_optional_query_param_malformed_is_miss() {
        let router = optional_query_param::<u32>("t");
        assert_eq!(router.match_request(&Request::get("/?t=abc")), None);
        assert_eq!(router.match_request(&Request::get("/")), Some(None));
    }

    #[test]
    fn test_unrenderable_values_print_nothing() {
        let slug = constant("collections").then(capture::<String>());
        assert_eq!(slug.path_for(&String::new()), None);
        assert_eq!(slug.path_for(&"rust".to_string()).as_deref(), Some("/collections/rust"));

        let code = query_param::<String>("code");
        assert_eq!(code.print(&String::new()), None);

        let optional = optional_query_param::<String>("code");
        assert_eq!(optional.print(&Some(String::new())), None);
        assert_eq!(optional.path_for(&None).as_deref(), Some("/"));
    }

    #[test]
    fn test_method_description() {
        assert_eq!(method(Method::POST).description(), &Description::Method("POST".into()));
    }

    #[test]
    fn test_method_consumes_nothing() {
        let mut req = Request::with_method(Method::POST, "/x");
        assert_eq!(method(Method::POST).parse(&mut req), Some(()));
        assert_eq!(req.path.len(), 1);
        assert_eq!(method(Method::GET).parse(&mut req), None);
    }

    #[test]
    fn test_empty_matches_root() {
        assert_eq!(empty().match_request(&Request::get("/")), Some(()));
        assert_eq!(empty().match_request(&Request::get("/a")), None);
    }
}
