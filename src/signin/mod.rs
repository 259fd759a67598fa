//! Steam OpenID sign-in.
//!
//! Signs in to a third-party website that delegates authentication to Steam,
//! reusing an already-authenticated Steam session:
//!
//! 1. `GET` the site's "sign in through Steam" URL, following every redirect,
//!    until the Steam OpenID page is reached.
//! 2. Stop if Steam shows its password login form (session not authenticated)
//!    or if the OpenID form cannot be located.
//! 3. `POST` the OpenID form fields to `/openid/login`, following the redirect
//!    chain back through the site's callback, which sets the site's session
//!    cookies.
//!
//! The same cookie jar is used for both requests and returned on success.
//!
//! # Example
//!
//! ```no_run
//! use steam_openid_signin::{SessionCookies, SteamOpenIdSignIn};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signin = SteamOpenIdSignIn::new()?;
//! let jar = signin
//!     .sign_in(
//!         "https://example.com/login/steam",
//!         SessionCookies::from_raw(["steamLoginSecure=76561198000000000%7C%7Ctoken"]),
//!     )
//!     .await?;
//! # let _ = jar;
//! # Ok(())
//! # }
//! ```

mod config;
mod cookies;
mod error;
mod page;

use std::sync::Arc;

use reqwest::Client;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, info, warn};

pub use config::{
    DEFAULT_MAX_REDIRECTS, DEFAULT_PROVIDER_BASE_URL, OPENID_LOGIN_PATH, SignInConfig,
};
pub use cookies::{SessionCookies, cookie_value, resolve_jar};
pub use error::{SignInError, SignInErrorKind};
pub use page::{
    LOGIN_FORM_ID, LoginFormData, OPENID_FORM_ID, ProviderPage, classify_provider_page,
};

use config::{ProviderEndpoint, build_signin_http_client, url_authority};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Signs in to websites through the Steam OpenID provider.
///
/// Cheap to keep around; every [`sign_in`](Self::sign_in) call builds its own
/// HTTP client bound to that call's cookie jar, so calls with separate jars
/// do not interfere.
#[derive(Debug, Clone)]
pub struct SteamOpenIdSignIn {
    config: SignInConfig,
    provider: ProviderEndpoint,
}

impl SteamOpenIdSignIn {
    /// Creates a sign-in client for `steamcommunity.com` with default transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`SignInError::InvalidProviderUrl`] if the default provider URL
    /// cannot be parsed.
    pub fn new() -> Result<Self, SignInError> {
        Self::with_config(SignInConfig::default())
    }

    /// Creates a sign-in client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SignInError::InvalidProviderUrl`] if
    /// `config.provider_base_url` is not an absolute http(s) URL with a host.
    pub fn with_config(config: SignInConfig) -> Result<Self, SignInError> {
        let provider = ProviderEndpoint::parse(&config.provider_base_url)?;
        Ok(Self { config, provider })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &SignInConfig {
        &self.config
    }

    /// Runs the sign-in flow starting at `url`.
    ///
    /// `cookies` carries the authenticated provider session: raw cookie
    /// strings are loaded into a new jar bound to the provider origin, an
    /// existing jar is used and mutated in place. On success the jar holds
    /// every cookie set along both redirect chains, including the target
    /// site's session cookies.
    ///
    /// # Errors
    ///
    /// - [`SignInError::Transport`] on any network failure.
    /// - [`SignInError::Redirect`] if `url` does not redirect to the provider.
    /// - [`SignInError::Authentication`] if the session is not signed in at the provider.
    /// - [`SignInError::Protocol`] if the OpenID form is missing or ambiguous.
    /// - [`SignInError::ClientBuild`] if the HTTP client cannot be constructed.
    #[tracing::instrument(skip(self, cookies), fields(provider = %self.provider.authority))]
    pub async fn sign_in(
        &self,
        url: &str,
        cookies: impl Into<SessionCookies>,
    ) -> Result<Arc<Jar>, SignInError> {
        let jar = resolve_jar(cookies.into(), &self.provider.origin);
        let client = build_signin_http_client(&self.config, Arc::clone(&jar))?;

        let html = self.fetch_provider_page(&client, url).await?;

        let form = match classify_provider_page(&html) {
            ProviderPage::OpenIdForm(form) => form,
            ProviderPage::PasswordLogin => {
                warn!("Provider session is not authenticated");
                return Err(SignInError::authentication(&self.provider.authority));
            }
            ProviderPage::Unrecognized { openid_forms } => {
                warn!(openid_forms, "Could not locate the OpenID login form");
                return Err(SignInError::protocol(openid_forms));
            }
        };

        self.submit_openid_form(&client, &form).await?;

        info!("Signed in through provider");
        Ok(jar)
    }

    /// GETs `url`, follows redirects, and returns the provider page body.
    async fn fetch_provider_page(&self, client: &Client, url: &str) -> Result<String, SignInError> {
        debug!(url = %url, "Requesting sign-in URL");

        let response = client
            .get(url)
            .header(ACCEPT, HTML_ACCEPT)
            .send()
            .await
            .inspect_err(|error| warn!(error = %error, "Sign-in request failed"))?;

        let final_url = response.url().clone();
        let final_authority = url_authority(&final_url);
        debug!(
            status = response.status().as_u16(),
            final_host = %final_authority,
            final_path = final_url.path(),
            "Sign-in redirect chain finished"
        );

        if !self.provider.is_provider_url(&final_url) {
            warn!(
                expected = %self.provider.authority,
                actual = %final_authority,
                "Sign-in URL did not redirect to provider"
            );
            return Err(SignInError::redirect(
                &self.provider.authority,
                &final_authority,
            ));
        }

        Ok(response
            .text()
            .await
            .inspect_err(|error| warn!(error = %error, "Failed to read provider page body"))?)
    }

    /// POSTs the OpenID form to the provider and follows the redirect chain
    /// back to the target site.
    async fn submit_openid_form(
        &self,
        client: &Client,
        form: &LoginFormData,
    ) -> Result<(), SignInError> {
        debug!(
            fields = form.len(),
            url = %self.provider.login_url,
            "Submitting OpenID form"
        );

        let response = client
            .post(self.provider.login_url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form.to_urlencoded())
            .send()
            .await
            .inspect_err(|error| warn!(error = %error, "OpenID form submission failed"))?;

        debug!(
            status = response.status().as_u16(),
            final_host = %url_authority(response.url()),
            "OpenID redirect chain finished"
        );

        Ok(())
    }
}

/// Signs in with default settings. See [`SteamOpenIdSignIn::sign_in`].
///
/// # Errors
///
/// Same as [`SteamOpenIdSignIn::sign_in`].
pub async fn sign_in(
    url: &str,
    cookies: impl Into<SessionCookies>,
) -> Result<Arc<Jar>, SignInError> {
    SteamOpenIdSignIn::new()?.sign_in(url, cookies).await
}
