//! Single-use HTTP session for one authentication attempt.
//!
//! Not shared and not pooled: a session owns its cookie jar and connection
//! pools, and dropping it closes both. No retries are attempted.

use crate::config::PortalConfig;
use crate::error::PortalResult;
use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Maximum redirects followed by the login POST.
const MAX_REDIRECTS: usize = 10;

/// Response from a portal request.
#[derive(Debug, Clone)]
pub struct PortalResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Cookie-carrying conversation with the portal.
pub struct Session {
    /// Follows redirects. Used for the landing page and login.
    client: reqwest::Client,
    /// Same cookie jar, never follows redirects. A redirect from an
    /// authenticated page means the session is not logged in.
    direct: reqwest::Client,
    /// Most recently observed anti-forgery token.
    token: Option<String>,
}

impl Session {
    /// Build a fresh session with an empty cookie jar.
    pub fn open(config: &PortalConfig) -> PortalResult<Self> {
        let jar = Arc::new(Jar::default());

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str())
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let direct = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::none())
            .user_agent(config.user_agent.as_str())
            .cookie_provider(jar)
            .build()?;

        debug!("portal session opened");
        Ok(Self {
            client,
            direct,
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// GET, following redirects.
    pub async fn get(&self, url: Url) -> PortalResult<PortalResponse> {
        let r = self.client.get(url).send().await?;
        Self::read(r).await
    }

    /// GET with query parameters, without following redirects.
    pub async fn get_direct(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> PortalResult<PortalResponse> {
        let r = self.direct.get(url).query(query).send().await?;
        Self::read(r).await
    }

    /// POST url-encoded form fields, following redirects.
    pub async fn post_form(
        &self,
        url: Url,
        form_fields: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
    ) -> PortalResult<PortalResponse> {
        let mut builder = self.client.post(url);
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }

        let r = builder.form(form_fields).send().await?;
        Self::read(r).await
    }

    async fn read(r: reqwest::Response) -> PortalResult<PortalResponse> {
        let status = r.status().as_u16();
        let url = r.url().to_string();
        let body = r.text().await?;
        Ok(PortalResponse { url, status, body })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("portal session closed");
    }
}
