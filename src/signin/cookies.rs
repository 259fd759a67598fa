//! Session cookie input and cookie jar helpers.
//!
//! Callers either hand over raw `Set-Cookie`-style strings taken from a
//! logged-in provider session, or an existing jar they keep sharing.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, instrument, warn};
use url::Url;

/// Session cookies carried into the sign-in flow.
#[derive(Clone)]
pub enum SessionCookies {
    /// Raw cookie strings (`name=value[; attributes]`), bound to the provider origin.
    Raw(Vec<String>),
    /// An existing jar; the sign-in flow mutates it in place.
    Jar(Arc<Jar>),
}

impl SessionCookies {
    /// Builds a raw cookie input from any iterator of strings.
    pub fn from_raw<I, S>(cookies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Raw(cookies.into_iter().map(Into::into).collect())
    }
}

// Raw cookie values are credentials; only the count is printed.
impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(cookies) => f
                .debug_tuple("Raw")
                .field(&format_args!("[{} cookie(s) REDACTED]", cookies.len()))
                .finish(),
            Self::Jar(_) => f.debug_tuple("Jar").finish_non_exhaustive(),
        }
    }
}

impl From<Vec<String>> for SessionCookies {
    fn from(cookies: Vec<String>) -> Self {
        Self::Raw(cookies)
    }
}

impl From<Arc<Jar>> for SessionCookies {
    fn from(jar: Arc<Jar>) -> Self {
        Self::Jar(jar)
    }
}

/// Resolves the session input into the single jar used for the whole flow.
///
/// Raw cookies go into a fresh jar, each bound to `provider_origin`. Blank
/// strings are skipped. An existing jar is returned as-is (same `Arc`).
#[instrument(level = "debug", skip_all, fields(provider = %provider_origin))]
pub fn resolve_jar(cookies: SessionCookies, provider_origin: &Url) -> Arc<Jar> {
    match cookies {
        SessionCookies::Jar(jar) => {
            debug!("Using caller-supplied cookie jar");
            jar
        }
        SessionCookies::Raw(raw) => {
            let jar = Arc::new(Jar::default());
            let mut loaded = 0usize;

            for (index, cookie) in raw.iter().enumerate() {
                let cookie = cookie.trim();
                if cookie.is_empty() {
                    warn!(index, "Skipping blank session cookie");
                    continue;
                }
                jar.add_cookie_str(cookie, provider_origin);
                debug!(index, name = cookie_name(cookie), "Loaded session cookie");
                loaded += 1;
            }

            debug!(count = loaded, "Built cookie jar from raw session cookies");
            jar
        }
    }
}

/// Returns the value of cookie `name` that `jar` would send to `url`.
#[must_use]
pub fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let header = header.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Name part of a raw cookie string, safe to log.
fn cookie_name(cookie: &str) -> &str {
    cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('=').map(|(name, _)| name))
        .unwrap_or_default()
        .trim()
}
