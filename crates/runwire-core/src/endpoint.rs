//! Socket URL derivation.
//!
//! The socket lives next to the page that hosts the client:
//!
//! ```text
//! http://host:3000/play/   →  ws://host:3000/play/ws
//! https://example.org/     →  wss://example.org/ws
//! ```
//!
//! The scheme is `wss` exactly when the page is `https`; every other page
//! scheme maps to `ws`. Query and fragment are dropped. The suffix is appended
//! to the path verbatim, without inserting a separator.

use url::Url;

use crate::error::ConnectionError;

/// Fixed suffix appended to the page path.
pub const SOCKET_PATH_SUFFIX: &str = "ws";

/// Derive the socket URL from the page location.
///
/// # Errors
///
/// - `ConnectionError::InvalidLocation` if the page has no host (e.g. a
///   `file:` URL) or the derived URL does not parse
pub fn socket_url(page: &Url) -> Result<Url, ConnectionError> {
    let scheme = if page.scheme() == "https" { "wss" } else { "ws" };

    let Some(host) = page.host_str() else {
        return Err(ConnectionError::InvalidLocation(format!("{page} has no host")));
    };

    let authority = match page.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    // Non-special schemes may have an empty path
    let path = if page.path().is_empty() { "/" } else { page.path() };

    let url = Url::parse(&format!("{scheme}://{authority}{path}{SOCKET_PATH_SUFFIX}"))?;
    tracing::debug!(%page, socket = %url, "derived socket url");
    Ok(url)
}
