//! Shared User-Agent string for sign-in HTTP clients.

/// Product token sent ahead of the crate version.
const PRODUCT: &str = "steam-openid-signin";

/// Default User-Agent for sign-in requests.
#[must_use]
pub(crate) fn default_signin_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (openid-signin)")
}
