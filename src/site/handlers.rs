//! Route handlers.
//!
//! Every handler is generic over the interpreter, so the axum backend and
//! the test backend run exactly the same code. Bodies are JSON or plain
//! text.

use std::time::Duration;

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::app::AppContext;
use crate::db::record::{insert, select_all, select_by_id, select_where};
use crate::db::{Database, DbError, Row};
use crate::external::Identity;
use crate::interpreter::derived::LOGIN_REQUIRED;
use crate::interpreter::handler::{self, Handler};
use crate::interpreter::Interpreter;
use crate::session::cookie;
use crate::site::records::{Collection, Episode, Gift, User};
use crate::site::route::{EpisodeId, Route};

/// Episodes per listing page.
pub const PAGE_SIZE: usize = 10;

const MAX_NAME_LEN: usize = 100;

/// The handler for `route`.
pub fn handle<I: Interpreter>(route: Route) -> Handler<I> {
    match route {
        Route::Home => home(),
        Route::Episodes { page } => episodes(page.unwrap_or(1)),
        Route::Episode { id, t } => episode(id, t),
        Route::Collection { slug } => collection(slug),
        Route::Account => account(),
        Route::UpdateProfile => update_profile(),
        Route::Login { code: Some(code), redirect } => login(code, redirect),
        Route::Login { code: None, redirect } => login_redirect(redirect),
        Route::Logout => logout(),
        Route::Gift { id } => gift(id),
        Route::Asset { file } => asset(file),
        Route::SiteMap => site_map(),
    }
}

/// Continue with the shared application state (links, sessions, providers).
fn with_app<I, F>(k: F) -> Handler<I>
where
    I: Interpreter,
    F: FnOnce(&AppContext<I::Database>) -> Handler<I> + Send + 'static,
{
    Handler::new(move |i: I| {
        let next = k(i.environment().app());
        next.run(i)
    })
}

fn not_found<I: Interpreter>() -> Handler<I> {
    handler::text(StatusCode::NOT_FOUND, "Not found")
}

fn database_error<I: Interpreter>(error: DbError) -> Handler<I> {
    tracing::error!(error = %error, "Database error");
    handler::text(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
}

fn episode_link<D: Database>(app: &AppContext<D>, row: &Row<Episode>) -> Option<String> {
    let id = u32::try_from(*row.id()).ok()?;
    Some(app.link(&Route::Episode { id: EpisodeId(id), t: None }))
}

fn episode_summary<D: Database>(app: &AppContext<D>, row: &Row<Episode>) -> serde_json::Value {
    let episode = row.data();
    json!({
        "number": episode.number,
        "title": episode.title,
        "subscription_only": episode.subscription_only,
        "link": episode_link(app, row),
    })
}

fn home<I: Interpreter>() -> Handler<I> {
    handler::with_session(|session| {
        with_app(move |app| {
            handler::json(
                StatusCode::OK,
                &json!({
                    "signed_in": session.is_some(),
                    "episodes": app.link(&Route::Episodes { page: None }),
                    "account": app.link(&Route::Account),
                    "login": app.link(&Route::Login { code: None, redirect: None }),
                    "sitemap": app.link(&Route::SiteMap),
                }),
            )
        })
    })
}

fn episodes<I: Interpreter>(page: u32) -> Handler<I> {
    let page = page.max(1);
    handler::execute(select_all::<Episode>(), move |result| match result {
        Err(e) => database_error(e),
        Ok(mut rows) => with_app(move |app| {
            rows.sort_by_key(|row| std::cmp::Reverse(row.data().number));
            let start = (page as usize - 1).saturating_mul(PAGE_SIZE);
            let listed: Vec<_> = rows
                .iter()
                .skip(start)
                .take(PAGE_SIZE)
                .map(|row| episode_summary(app, row))
                .collect();
            let next = (rows.len() > start.saturating_add(PAGE_SIZE))
                .then(|| app.link(&Route::Episodes { page: Some(page + 1) }));
            handler::json(
                StatusCode::OK,
                &json!({ "page": page, "episodes": listed, "next": next }),
            )
        }),
    })
}

fn episode<I: Interpreter>(id: EpisodeId, t: Option<u32>) -> Handler<I> {
    handler::execute(select_by_id::<Episode>(&i64::from(id.0)), move |result| match result {
        Err(e) => database_error(e),
        Ok(None) => not_found(),
        Ok(Some(row)) => handler::with_session(move |session| {
            let episode = row.into_data();
            if episode.subscription_only && session.is_none() {
                return with_app(move |app| {
                    let back = app.link(&Route::Episode { id, t });
                    handler::json(
                        StatusCode::OK,
                        &json!({
                            "number": episode.number,
                            "title": episode.title,
                            "locked": true,
                            "login": app.link(&Route::Login { code: None, redirect: Some(back) }),
                        }),
                    )
                });
            }
            let start_at = t.map(|t| t.min(u32::try_from(episode.media_duration).unwrap_or(0)));
            handler::json(
                StatusCode::OK,
                &json!({
                    "number": episode.number,
                    "title": episode.title,
                    "synopsis": episode.synopsis,
                    "media_duration": episode.media_duration,
                    "start_at": start_at,
                    "locked": false,
                }),
            )
        }),
    })
}

fn collection<I: Interpreter>(slug: String) -> Handler<I> {
    handler::execute(select_where::<Collection>("slug", slug.clone()), move |result| match result {
        Err(e) => database_error(e),
        Ok(rows) => match rows.into_iter().next() {
            None => not_found(),
            Some(row) => handler::execute(select_where::<Episode>("collection", slug), move |result| match result {
                Err(e) => database_error(e),
                Ok(mut episodes) => with_app(move |app| {
                    episodes.sort_by_key(|e| e.data().number);
                    let collection = row.into_data();
                    let listed: Vec<_> = episodes.iter().map(|e| episode_summary(app, e)).collect();
                    handler::json(
                        StatusCode::OK,
                        &json!({
                            "slug": collection.slug,
                            "title": collection.title,
                            "description": collection.description,
                            "episodes": listed,
                        }),
                    )
                }),
            }),
        },
    })
}

fn account<I: Interpreter>() -> Handler<I> {
    handler::require_session(|session| {
        handler::execute(select_by_id::<User>(&session.user_id), move |result| match result {
            Err(e) => database_error(e),
            Ok(None) => {
                tracing::warn!(user_id = %session.user_id, "Session refers to a missing user");
                handler::text(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED)
            }
            Ok(Some(user)) => with_app(move |app| {
                let user = user.into_data();
                handler::json(
                    StatusCode::OK,
                    &json!({
                        "name": user.name,
                        "email": user.email,
                        "csrf_token": session.csrf_token,
                        "update": app.link(&Route::UpdateProfile),
                        "logout": app.link(&Route::Logout),
                    }),
                )
            }),
        })
    })
}

fn update_profile<I: Interpreter>() -> Handler<I> {
    handler::verified_post(|session, form| {
        let name = form.get("name").map(str::trim).unwrap_or_default().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return handler::text(StatusCode::BAD_REQUEST, "Name must be between 1 and 100 characters.");
        }
        handler::execute(select_by_id::<User>(&session.user_id), move |result| match result {
            Err(e) => database_error(e),
            Ok(None) => handler::text(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED),
            Ok(Some(row)) => {
                let mut user = row.data().clone();
                user.name = name;
                handler::execute(row.update(&user), |result| match result {
                    Ok(Some(_)) => with_app(|app| handler::redirect(app.link(&Route::Account))),
                    Ok(None) => not_found(),
                    Err(e) => database_error(e),
                })
            }
        })
    })
}

fn login_redirect<I: Interpreter>(redirect: Option<String>) -> Handler<I> {
    with_app(move |app| handler::redirect(app.identity.authorize_url(redirect.as_deref())))
}

fn login<I: Interpreter>(code: String, redirect: Option<String>) -> Handler<I> {
    with_app(move |app| {
        handler::on_complete(app.identity.exchange(&code), move |result| match result {
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                handler::text(StatusCode::BAD_GATEWAY, "We couldn't log you in. Please try again.")
            }
            Ok(identity) => find_or_create_user(identity, redirect),
        })
    })
}

fn find_or_create_user<I: Interpreter>(identity: Identity, redirect: Option<String>) -> Handler<I> {
    handler::execute(select_where::<User>("subject", identity.subject.clone()), move |result| match result {
        Err(e) => database_error(e),
        Ok(users) => match users.into_iter().next() {
            Some(user) => start_session(*user.id(), redirect),
            None => {
                let user = User {
                    subject: identity.subject,
                    email: identity.email,
                    name: identity.name,
                };
                handler::execute(insert(&user), move |result| match result {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id(), "User created");
                        start_session(*user.id(), redirect)
                    }
                    Err(e) => database_error(e),
                })
            }
        },
    })
}

/// Only same-site paths are followed after login.
fn is_local(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

fn start_session<I: Interpreter>(user_id: Uuid, redirect: Option<String>) -> Handler<I> {
    with_app(move |app| {
        let session = app.sessions.start(user_id);
        let mut headers = HeaderMap::new();
        if let Some(value) = cookie::set_cookie(&app.session_cookie, session.id, app.session_ttl.as_secs()) {
            headers.insert(SET_COOKIE, value);
        }
        let target = redirect
            .filter(|r| is_local(r))
            .unwrap_or_else(|| app.link(&Route::Account));
        handler::redirect_with(target, headers)
    })
}

fn logout<I: Interpreter>() -> Handler<I> {
    handler::with_session(|session| {
        with_app(move |app| {
            if let Some(session) = session {
                app.sessions.end(&session.id);
            }
            let mut headers = HeaderMap::new();
            if let Some(value) = cookie::clear_cookie(&app.session_cookie) {
                headers.insert(SET_COOKIE, value);
            }
            handler::redirect_with(app.link(&Route::Home), headers)
        })
    })
}

fn gift<I: Interpreter>(id: Uuid) -> Handler<I> {
    handler::execute(select_by_id::<Gift>(&id), |result| match result {
        Err(e) => database_error(e),
        Ok(None) => not_found(),
        Ok(Some(row)) => {
            let gift = row.into_data();
            handler::json(
                StatusCode::OK,
                &json!({
                    "months": gift.months,
                    "message": gift.message,
                    "redeemed": gift.redeemed_by.is_some(),
                }),
            )
        }
    })
}

fn is_safe_file_name(name: &str) -> bool {
    !name.starts_with('.') && !name.contains(['/', '\\'])
}

fn asset<I: Interpreter>(file: String) -> Handler<I> {
    with_app(move |app| {
        if !is_safe_file_name(&file) {
            return not_found();
        }
        handler::serve_file(app.assets.dir.join(&file), Duration::from_secs(app.assets.max_age_secs))
    })
}

fn site_map<I: Interpreter>() -> Handler<I> {
    with_app(|app| {
        let routes: Vec<_> = app
            .site
            .description()
            .routes()
            .into_iter()
            .map(|route| {
                json!({
                    "route": route.to_string(),
                    "method": route.method,
                    "path": route.path,
                    "query": route.query,
                })
            })
            .collect();
        handler::json(StatusCode::OK, &json!({ "routes": routes }))
    })
}
