//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::extract::Query;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use uuid::Uuid;

use content_server::config::ServerConfig;
use content_server::db::MemoryDatabase;
use content_server::external::{Identity, IdentityProvider, StaticIdentityProvider};
use content_server::interpreter::{Environment, Outcome, RequestScope, TestInterpreter};
use content_server::session::Session;
use content_server::site::{self, schema, Route};
use content_server::{AppContext, HttpServer, Shutdown};

/// Login code the static provider accepts.
pub const GOOD_CODE: &str = "good-code";

pub fn ada() -> Identity {
    Identity {
        subject: "sub-ada".into(),
        email: "ada@example.com".into(),
        name: "Ada".into(),
    }
}

pub fn static_identity() -> Arc<dyn IdentityProvider> {
    Arc::new(StaticIdentityProvider::new().with_identity(GOOD_CODE, ada()))
}

/// A memory database with the site schema and sample content.
pub async fn seeded_database() -> (MemoryDatabase, Uuid) {
    let database = MemoryDatabase::new();
    schema::install(&database);
    let gift_id = schema::seed(&database).await.unwrap();
    (database, gift_id)
}

/// The site run in-process against the test interpreter.
pub struct TestApp {
    pub app: Arc<AppContext<MemoryDatabase>>,
    pub database: MemoryDatabase,
    pub gift_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let (database, gift_id) = seeded_database().await;
        let app = Arc::new(AppContext::new(database.clone(), static_identity(), &config));
        Self { app, database, gift_id }
    }

    /// Run `route` to its outcome, ending the request afterwards.
    pub async fn run(&self, route: Route, session: Option<&Session>, body: Option<&str>) -> Outcome {
        let scope = RequestScope {
            request_id: "test".into(),
            session_id: session.map(|s| s.id),
            body: body.map(|b| Bytes::copy_from_slice(b.as_bytes())),
        };
        let interpreter = TestInterpreter::new(Environment::new(Arc::clone(&self.app), scope));
        site::serve(interpreter, route).await
    }

    /// Log in through the login route and return the resulting session.
    pub async fn login(&self) -> Session {
        let outcome = self
            .run(
                Route::Login {
                    code: Some(GOOD_CODE.into()),
                    redirect: None,
                },
                None,
                None,
            )
            .await;
        let cookie = outcome.set_cookie().expect("login sets a cookie");
        let id = cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .and_then(|(_, value)| Uuid::parse_str(value).ok())
            .expect("cookie carries a session id");
        self.app.sessions.get(&id).expect("session is stored")
    }
}

/// A server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub app: Arc<AppContext<MemoryDatabase>>,
    pub database: MemoryDatabase,
    pub gift_id: Uuid,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server(config: ServerConfig, identity: Arc<dyn IdentityProvider>) -> TestServer {
    let (database, gift_id) = seeded_database().await;
    let app = Arc::new(AppContext::new(database.clone(), identity, &config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(Arc::clone(&app), &config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        app,
        database,
        gift_id,
    }
}

/// A client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Code the mock provider's authorize endpoint hands back.
pub const MOCK_CODE: &str = "mock-code";

/// An identity provider on an ephemeral port.
///
/// `/authorize` sends the browser straight back to `redirect_uri` with
/// [`MOCK_CODE`] and the caller's `state`; `/token` answers every exchange
/// with `status` and `body` after `delay`.
pub async fn start_mock_identity_provider(delay: Duration, status: StatusCode, body: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new()
        .route(
            "/authorize",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let Some(mut callback) = params.get("redirect_uri").and_then(|uri| url::Url::parse(uri).ok()) else {
                    return (StatusCode::BAD_REQUEST, "missing redirect_uri").into_response();
                };
                {
                    let mut query = callback.query_pairs_mut();
                    query.append_pair("code", MOCK_CODE);
                    if let Some(state) = params.get("state") {
                        query.append_pair("state", state);
                    }
                }
                Redirect::to(callback.as_str()).into_response()
            }),
        )
        .route(
            "/token",
            post(move || {
                let body = body.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    (status, [("content-type", "application/json")], body)
                }
            }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
