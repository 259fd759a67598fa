//! Steam OpenID Sign-In Library
//!
//! Signs in to third-party websites that offer "Sign in through Steam", using
//! cookies from a Steam Community session that is already logged in. The
//! result is a cookie jar holding the website's session cookies.
//!
//! # Architecture
//!
//! - [`signin`] - the sign-in flow, its configuration, cookie handling,
//!   provider page inspection, and error types

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod signin;
mod user_agent;

// Re-export commonly used types
pub use signin::{
    LoginFormData, ProviderPage, SessionCookies, SignInConfig, SignInError, SignInErrorKind,
    SteamOpenIdSignIn, classify_provider_page, cookie_value, sign_in,
};
