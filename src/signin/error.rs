//! Error types for the sign-in flow.
//!
//! Every failure is terminal: the flow stops at the first error and nothing
//! is retried.

use thiserror::Error;

/// Errors that can occur while signing in through the identity provider.
#[derive(Debug, Error)]
pub enum SignInError {
    /// Network-level failure on either request (DNS, connect, TLS, body read).
    ///
    /// The underlying `reqwest` error is passed through unchanged.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The sign-in URL did not end up on the provider after following redirects.
    #[error(
        "was not redirected to {expected} (ended at {actual})\n  Suggestion: Make sure the sign-in URL is correct"
    )]
    Redirect {
        /// Provider host the redirect chain should have reached.
        expected: String,
        /// Host of the final response.
        actual: String,
    },

    /// The provider served its password login form instead of the OpenID form.
    #[error(
        "not signed in at {provider}\n  Suggestion: Supply cookies from a session that is logged in to {provider}"
    )]
    Authentication {
        /// Provider host that asked for a password login.
        provider: String,
    },

    /// The provider page did not contain exactly one OpenID login form.
    #[error("could not find the OpenID login form (found {found} candidate form(s))")]
    Protocol {
        /// Number of elements carrying the OpenID form marker.
        found: usize,
    },

    /// The configured provider base URL is unusable.
    #[error("invalid provider URL '{url}': {reason}")]
    InvalidProviderUrl {
        /// The configured URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed from the configuration.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

/// Flat classification of [`SignInError`] for callers that branch on category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignInErrorKind {
    /// Network or transport failure.
    Transport,
    /// Redirect chain did not reach the provider.
    Redirect,
    /// Session is not authenticated at the provider.
    Authentication,
    /// Provider page did not have the expected shape.
    Protocol,
    /// Invalid configuration or client construction failure.
    Configuration,
}

impl SignInError {
    /// Creates a `Redirect` error.
    #[must_use]
    pub fn redirect(expected: &str, actual: &str) -> Self {
        Self::Redirect {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates an `Authentication` error.
    #[must_use]
    pub fn authentication(provider: &str) -> Self {
        Self::Authentication {
            provider: provider.to_string(),
        }
    }

    /// Creates a `Protocol` error.
    #[must_use]
    pub fn protocol(found: usize) -> Self {
        Self::Protocol { found }
    }

    /// Creates an `InvalidProviderUrl` error.
    #[must_use]
    pub fn invalid_provider_url(url: &str, reason: &str) -> Self {
        Self::InvalidProviderUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> SignInErrorKind {
        match self {
            Self::Transport(_) => SignInErrorKind::Transport,
            Self::Redirect { .. } => SignInErrorKind::Redirect,
            Self::Authentication { .. } => SignInErrorKind::Authentication,
            Self::Protocol { .. } => SignInErrorKind::Protocol,
            Self::InvalidProviderUrl { .. } | Self::ClientBuild { .. } => {
                SignInErrorKind::Configuration
            }
        }
    }
}
