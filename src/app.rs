//! Process-wide application state.
//!
//! Built once at startup and shared by every request through an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AssetsConfig, ServerConfig};
use crate::db::Database;
use crate::external::IdentityProvider;
use crate::routing::Router;
use crate::session::SessionStore;
use crate::site::{self, Route};

pub struct AppContext<D: Database> {
    pub database: D,
    /// The site grammar: dispatch and link printing.
    pub site: Router<Route>,
    pub sessions: SessionStore,
    pub identity: Arc<dyn IdentityProvider>,
    pub assets: AssetsConfig,
    pub session_cookie: String,
    pub session_ttl: Duration,
}

impl<D: Database> AppContext<D> {
    pub fn new(database: D, identity: Arc<dyn IdentityProvider>, config: &ServerConfig) -> Self {
        Self {
            database,
            site: site::router(),
            sessions: SessionStore::new(config.session.ttl_secs),
            identity,
            assets: config.assets.clone(),
            session_cookie: config.session.cookie_name.clone(),
            session_ttl: Duration::from_secs(config.session.ttl_secs),
        }
    }

    /// The canonical link for `route`.
    pub fn link(&self, route: &Route) -> String {
        self.site.path_for(route).unwrap_or_else(|| {
            tracing::error!(?route, "Route has no printer in the site grammar");
            "/".to_string()
        })
    }
}
