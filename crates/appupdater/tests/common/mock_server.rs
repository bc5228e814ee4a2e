//! Mock server helpers for the update endpoints
//!
//! Wraps wiremock with the three resources an update run touches: the
//! archive, the version text, and the shortcut name text.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Serve `body` as plain text at `route`
pub async fn mock_text(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve raw bytes at `route`
pub async fn mock_bytes(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Answer `route` with `status` and no body
pub async fn mock_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve the version and shortcut name with the padding a hand-edited file
/// usually carries
pub async fn mock_metadata(server: &MockServer) {
    mock_text(server, VERSION_PATH, &format!("{}\n", REMOTE_VERSION)).await;
    mock_text(server, SHORTCUT_NAME_PATH, &format!("  {}\r\n", SHORTCUT_NAME)).await;
}

/// Serve metadata plus `archive` at the archive route
pub async fn mock_release(server: &MockServer, archive: &[u8]) {
    mock_metadata(server).await;
    mock_bytes(server, ARCHIVE_PATH, archive).await;
}

/// Full URL of `route` on `server`
pub fn url_for(server: &MockServer, route: &str) -> String {
    format!("{}{}", server.uri(), route)
}
