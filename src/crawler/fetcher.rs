//! Page fetching and response classification
//!
//! One GET per call, strictly request/response on the shared connection.
//! Every way a fetch can go wrong during the crawl is folded into
//! `FetchOutcome` so the coordinator can decide between "skip this page"
//! and "the connection is dead".

use crate::config::SiteConfig;
use crate::http::{build_request, receive_response, Connection, CookieJar, HttpResponse};
use crate::CodecError;

/// Classified result of fetching one page
#[derive(Debug)]
pub enum FetchOutcome {
    /// Status 200 with a complete body
    Success(HttpResponse),

    /// Any non-200 status (per-page failure; never fatal)
    HttpError { status: u16 },

    /// Peer closed mid-body; the page is unusable (per-page failure)
    Truncated,

    /// The response header block failed to parse (per-page failure)
    Malformed(String),

    /// Read timeout expired waiting for the response (per-page failure)
    Timeout,

    /// Stream-level failure; counts toward the dead-connection stop
    ConnectionFailed(String),
}

/// Sends a GET for `path` and reads the response
///
/// Wire format: `GET <path> HTTP/1.1`, `Host`, `Cookie` (omitted when
/// the jar is empty), `User-Agent`.
pub fn request_get<C: Connection + ?Sized>(
    conn: &mut C,
    site: &SiteConfig,
    jar: &CookieJar,
    path: &str,
) -> Result<HttpResponse, CodecError> {
    let cookie = jar.header_value();
    let mut headers: Vec<(&str, &str)> = Vec::new();
    if let Some(value) = cookie.as_deref() {
        headers.push(("Cookie", value));
    }
    headers.push(("User-Agent", &site.user_agent));

    let request = build_request("GET", path, &site.host, &headers, None);
    conn.send(&request)?;
    receive_response(conn)
}

/// Fetches one page during the crawl and classifies the outcome
pub fn fetch_page<C: Connection + ?Sized>(
    conn: &mut C,
    site: &SiteConfig,
    jar: &CookieJar,
    path: &str,
) -> FetchOutcome {
    match request_get(conn, site, jar, path) {
        Ok(response) => {
            if response.status_code != 200 {
                FetchOutcome::HttpError {
                    status: response.status_code,
                }
            } else if !response.is_complete() {
                FetchOutcome::Truncated
            } else {
                FetchOutcome::Success(response)
            }
        }
        Err(e) if e.is_timeout() => FetchOutcome::Timeout,
        Err(CodecError::ConnectionClosed) => {
            FetchOutcome::ConnectionFailed("peer closed the connection".to_string())
        }
        Err(CodecError::BadStatusLine(line)) => FetchOutcome::Malformed(line),
        Err(CodecError::Io(e)) => FetchOutcome::ConnectionFailed(e.to_string()),
    }
}
