//! Identity provider client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::IdentityConfig;
use crate::external::error::ExternalError;
use crate::interpreter::Promise;
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

/// Who the provider says the user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-side stable id.
    pub subject: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Exchanges login codes for identities.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Where to send a user who has no code yet.
    fn authorize_url(&self, redirect: Option<&str>) -> String;

    fn exchange(&self, code: &str) -> Promise<Result<Identity, ExternalError>>;
}

/// Talks to the provider's token endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    authorize_url: Url,
    token_url: Url,
    client_id: String,
    redirect_uri: Url,
    deadline: Duration,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig, deadline: Duration) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            authorize_url: Url::parse(&config.authorize_url)?,
            token_url: Url::parse(&config.token_url)?,
            client_id: config.client_id.clone(),
            redirect_uri: Url::parse(&config.redirect_uri)?,
            deadline,
        })
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn authorize_url(&self, redirect: Option<&str>) -> String {
        let mut url = self.authorize_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.client_id);
            query.append_pair("response_type", "code");
            query.append_pair("redirect_uri", self.redirect_uri.as_str());
            if let Some(redirect) = redirect {
                query.append_pair("state", redirect);
            }
        }
        url.into()
    }

    fn exchange(&self, code: &str) -> Promise<Result<Identity, ExternalError>> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .finish();
        let request = self
            .client
            .post(self.token_url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let deadline = self.deadline;

        Promise::spawn(async move {
            let result = with_deadline("identity.exchange", deadline, async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| ExternalError::Transport(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ExternalError::Rejected {
                        status: status.as_u16(),
                    });
                }
                response
                    .json::<Identity>()
                    .await
                    .map_err(|e| ExternalError::Decode(e.to_string()))
            })
            .await;

            let outcome = match &result {
                Ok(_) => "ok",
                Err(ExternalError::Timeout(_)) => "timeout",
                Err(_) => "error",
            };
            metrics::record_external_call("identity", outcome);
            if let Err(e) = &result {
                tracing::warn!(error = %e, "Identity exchange failed");
            }
            result
        })
    }
}

/// A fixed code → identity table, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identities: Arc<HashMap<String, Identity>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(self, code: impl Into<String>, identity: Identity) -> Self {
        let mut identities = (*self.identities).clone();
        identities.insert(code.into(), identity);
        Self {
            identities: Arc::new(identities),
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn authorize_url(&self, redirect: Option<&str>) -> String {
        match redirect {
            Some(redirect) => format!(
                "/login?code=static&redirect={}",
                url::form_urlencoded::byte_serialize(redirect.as_bytes()).collect::<String>()
            ),
            None => "/login?code=static".to_string(),
        }
    }

    fn exchange(&self, code: &str) -> Promise<Result<Identity, ExternalError>> {
        Promise::fulfilled(
            self.identities
                .get(code)
                .cloned()
                .ok_or(ExternalError::Rejected { status: 400 }),
        )
    }
}
