use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var("SIGNIN_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}; wiremock-based test cannot run in this environment",
        location.file(),
        location.line()
    );
    if socket_tests_required() {
        panic!("{message}. Set SIGNIN_REQUIRE_SOCKET_TESTS=0 to allow local skip behavior.");
    }

    eprintln!(
        "{message}. Skipping test. Set SIGNIN_REQUIRE_SOCKET_TESTS=1 to fail-fast instead."
    );
    true
}

/// Starts the two mock servers a sign-in needs: the target site and the provider.
pub async fn start_site_and_provider_or_skip() -> Option<(MockServer, MockServer)> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some((MockServer::start().await, MockServer::start().await))
    }
}

/// Returns a localhost URL whose port has nothing listening on it.
#[must_use]
pub fn closed_localhost_url() -> Option<String> {
    let listener = TcpListener::bind("127.0.0.1:0").ok()?;
    let port = listener.local_addr().ok()?.port();
    drop(listener);
    Some(format!("http://127.0.0.1:{port}/login/steam"))
}
