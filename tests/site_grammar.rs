//! Round-trip and dispatch properties of the site grammar.

use axum::http::Method;
use proptest::option;
use proptest::prelude::*;
use uuid::Uuid;

use content_server::routing::Request;
use content_server::site::{router, EpisodeId, Route};

fn text() -> impl Strategy<Value = String> {
    "\\PC{0,16}"
}

/// Routes carrying an empty string have no link: it would not parse back.
fn has_empty_text(route: &Route) -> bool {
    match route {
        Route::Collection { slug } => slug.is_empty(),
        Route::Asset { file } => file.is_empty(),
        Route::Login { code, redirect } => [code, redirect].into_iter().flatten().any(String::is_empty),
        _ => false,
    }
}

fn route() -> impl Strategy<Value = Route> {
    prop_oneof![
        Just(Route::Home),
        option::of(any::<u32>()).prop_map(|page| Route::Episodes { page }),
        (any::<u32>(), option::of(any::<u32>())).prop_map(|(id, t)| Route::Episode { id: EpisodeId(id), t }),
        text().prop_map(|slug| Route::Collection { slug }),
        Just(Route::Account),
        Just(Route::UpdateProfile),
        (option::of(text()), option::of(text())).prop_map(|(code, redirect)| Route::Login { code, redirect }),
        Just(Route::Logout),
        any::<u128>().prop_map(|n| Route::Gift { id: Uuid::from_u128(n) }),
        text().prop_map(|file| Route::Asset { file }),
        Just(Route::SiteMap),
    ]
}

proptest! {
    #[test]
    fn printed_links_route_back(route in route()) {
        let site = router();
        match site.print(&route) {
            Some(printed) => {
                let reparsed = Request::with_method(printed.method.clone(), &printed.link());
                prop_assert_eq!(site.match_request(&reparsed), Some(route));
            }
            None => prop_assert!(has_empty_text(&route), "no link for {:?}", route),
        }
    }

    #[test]
    fn trailing_segments_never_match(id in any::<u32>(), extra in "\\PC{1,16}") {
        let mut request = Request::get(&format!("/episodes/{id}"));
        request.path.push_back(extra);
        prop_assert_eq!(router().match_request(&request), None);
    }

    #[test]
    fn unknown_query_keys_never_match(id in any::<u32>(), value in text()) {
        let mut request = Request::get(&format!("/episodes/{id}"));
        request.query.insert("unknown".into(), value);
        prop_assert_eq!(router().match_request(&request), None);
    }
}

#[test]
fn episode_example() {
    let site = router();
    let episode = Route::Episode { id: EpisodeId(42), t: None };
    assert_eq!(site.path_for(&episode).as_deref(), Some("/episodes/42"));
    assert_eq!(
        site.match_request(&Request::get("/episodes/42?t=90")),
        Some(Route::Episode { id: EpisodeId(42), t: Some(90) })
    );
}

#[test]
fn post_link_followed_as_get_reads_the_account() {
    let site = router();
    let printed = site.print(&Route::UpdateProfile).unwrap();
    assert_eq!(printed.method, Method::POST);
    assert_eq!(site.match_request(&Request::get(&printed.link())), Some(Route::Account));
}
