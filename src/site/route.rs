//! Every endpoint of the site and the grammar relating them to requests.

use std::fmt;

use axum::http::Method;
use uuid::Uuid;

use crate::routing::{capture, choice, constant, method, optional_query_param, Param, Router};

/// Episode number as it appears in links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeId(pub u32);

impl Param for EpisodeId {
    const KIND: &'static str = "int";

    fn parse(raw: &str) -> Option<Self> {
        <u32 as Param>::parse(raw).map(EpisodeId)
    }

    fn render(&self) -> Option<String> {
        self.0.render()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Episodes { page: Option<u32> },
    Episode { id: EpisodeId, t: Option<u32> },
    Collection { slug: String },
    Account,
    UpdateProfile,
    Login { code: Option<String>, redirect: Option<String> },
    Logout,
    Gift { id: Uuid },
    Asset { file: String },
    SiteMap,
}

impl Route {
    /// Low-cardinality name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Episodes { .. } => "episodes",
            Route::Episode { .. } => "episode",
            Route::Collection { .. } => "collection",
            Route::Account => "account",
            Route::UpdateProfile => "update_profile",
            Route::Login { .. } => "login",
            Route::Logout => "logout",
            Route::Gift { .. } => "gift",
            Route::Asset { .. } => "asset",
            Route::SiteMap => "sitemap",
        }
    }
}

fn get() -> Router<()> {
    method(Method::GET)
}

/// The site grammar. Order matters: the first alternative that consumes
/// the whole request wins.
pub fn router() -> Router<Route> {
    choice(vec![
        get().to(Route::Home),
        get()
            .then(constant("episodes"))
            .then(optional_query_param::<u32>("page"))
            .variant(
                |page| Some(Route::Episodes { page }),
                |route| match route {
                    Route::Episodes { page } => Some(*page),
                    _ => None,
                },
            ),
        get()
            .then(constant("episodes"))
            .then(capture::<EpisodeId>().and(optional_query_param::<u32>("t")))
            .variant(
                |(id, t)| Some(Route::Episode { id, t }),
                |route| match route {
                    Route::Episode { id, t } => Some((*id, *t)),
                    _ => None,
                },
            ),
        get().then(constant("collections")).then(capture::<String>()).variant(
            |slug| Some(Route::Collection { slug }),
            |route| match route {
                Route::Collection { slug } => Some(slug.clone()),
                _ => None,
            },
        ),
        get().then(constant("account")).to(Route::Account),
        method(Method::POST).then(constant("account")).to(Route::UpdateProfile),
        get()
            .then(constant("login"))
            .then(
                optional_query_param::<String>("code")
                    .and(optional_query_param::<String>("redirect"))
                    .and(optional_query_param::<String>("state")),
            )
            // Identity providers hand the post-login target back as `state`;
            // links always print it as `redirect`.
            .variant(
                |((code, redirect), state)| Some(Route::Login { code, redirect: redirect.or(state) }),
                |route| match route {
                    Route::Login { code, redirect } => Some(((code.clone(), redirect.clone()), None)),
                    _ => None,
                },
            ),
        get().then(constant("logout")).to(Route::Logout),
        get().then(constant("gifts")).then(capture::<Uuid>()).variant(
            |id| Some(Route::Gift { id }),
            |route| match route {
                Route::Gift { id } => Some(*id),
                _ => None,
            },
        ),
        get().then(constant("assets")).then(capture::<String>()).variant(
            |file| Some(Route::Asset { file }),
            |route| match route {
                Route::Asset { file } => Some(file.clone()),
                _ => None,
            },
        ),
        get().then(constant("sitemap")).to(Route::SiteMap),
    ])
}
