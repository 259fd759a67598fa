//! Transport configuration for the sign-in flow.
//!
//! All networking defaults live here and are passed explicitly into
//! [`super::SteamOpenIdSignIn`] instead of being read from ambient global state.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::user_agent;

use super::SignInError;

/// Canonical base URL of the identity provider.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://steamcommunity.com";

/// Path of the provider's OpenID login endpoint (form target).
pub const OPENID_LOGIN_PATH: &str = "/openid/login";

/// Maximum redirect hops followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Configuration for a [`super::SteamOpenIdSignIn`].
///
/// Timeouts default to `None`, which leaves the HTTP transport defaults in
/// place.
#[derive(Debug, Clone)]
pub struct SignInConfig {
    /// Base URL of the identity provider. Only tests point this elsewhere.
    pub provider_base_url: String,
    /// User-Agent header sent on every request.
    pub user_agent: String,
    /// TCP connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Total per-request timeout, covering the whole redirect chain.
    pub timeout: Option<Duration>,
    /// Redirect hops followed per request before giving up.
    pub max_redirects: usize,
}

impl Default for SignInConfig {
    fn default() -> Self {
        Self {
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            user_agent: user_agent::default_signin_user_agent(),
            connect_timeout: None,
            timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl SignInConfig {
    /// Overrides the provider base URL.
    #[must_use]
    pub fn with_provider_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.provider_base_url = base_url.into();
        self
    }

    /// Overrides the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the total per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the redirect hop limit.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

/// Validated provider endpoints derived from [`SignInConfig::provider_base_url`].
#[derive(Debug, Clone)]
pub(crate) struct ProviderEndpoint {
    /// Origin the raw session cookies are bound to.
    pub origin: Url,
    /// `host[:port]` that the GET redirect chain must end on.
    pub authority: String,
    /// Target of the OpenID form submission.
    pub login_url: Url,
}

impl ProviderEndpoint {
    pub(crate) fn parse(base_url: &str) -> Result<Self, SignInError> {
        let origin = Url::parse(base_url.trim())
            .map_err(|e| SignInError::invalid_provider_url(base_url, &e.to_string()))?;

        if !matches!(origin.scheme(), "http" | "https") {
            return Err(SignInError::invalid_provider_url(
                base_url,
                "scheme must be http or https",
            ));
        }

        let authority = url_authority(&origin);
        if authority.is_empty() {
            return Err(SignInError::invalid_provider_url(base_url, "missing host"));
        }

        let login_url = origin
            .join(OPENID_LOGIN_PATH)
            .map_err(|e| SignInError::invalid_provider_url(base_url, &e.to_string()))?;

        Ok(Self {
            origin,
            authority,
            login_url,
        })
    }

    /// Returns true if `url` is served from the provider's host (and port).
    pub(crate) fn is_provider_url(&self, url: &Url) -> bool {
        url_authority(url).eq_ignore_ascii_case(&self.authority)
    }
}

/// Returns `host[:port]` for `url`; the port only appears when it is not the
/// scheme default.
#[must_use]
pub(crate) fn url_authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Builds the HTTP client for one sign-in attempt, bound to `jar`.
///
/// # Errors
///
/// Returns [`SignInError::ClientBuild`] when client construction fails.
pub(crate) fn build_signin_http_client(
    config: &SignInConfig,
    jar: Arc<Jar>,
) -> Result<Client, SignInError> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(Policy::limited(config.max_redirects))
        .cookie_provider(jar)
        .gzip(true);

    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    debug!(
        max_redirects = config.max_redirects,
        connect_timeout = ?config.connect_timeout,
        timeout = ?config.timeout,
        "Building sign-in HTTP client"
    );

    builder
        .build()
        .map_err(|source| SignInError::ClientBuild { source })
}
