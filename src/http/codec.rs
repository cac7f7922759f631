//! HTTP/1.1 message codec
//!
//! Builds outgoing request byte sequences and reassembles incoming
//! responses from the raw byte stream. Responses are framed by
//! `Content-Length` only; no read is ever assumed to deliver a whole
//! message, a whole line, or even the header terminator in one piece.

use crate::http::Connection;
use crate::CodecError;
use std::collections::HashMap;

/// Receive buffer size per recv call
const RECV_BUFFER_SIZE: usize = 4096;

/// A parsed HTTP response
///
/// Header names are lower-cased and the last occurrence of a repeated
/// header wins, except `Set-Cookie`, where every occurrence is retained
/// in order in `set_cookie` (a response routinely carries several).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub set_cookie: Vec<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    /// The declared Content-Length; missing or malformed counts as 0
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// Whether the body matches the declared length
    ///
    /// False means the peer closed mid-body; callers must treat such a
    /// response as a fetch failure.
    pub fn is_complete(&self) -> bool {
        self.body.len() >= self.content_length()
    }

    /// The body decoded as UTF-8, with invalid sequences replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Renders a well-formed HTTP/1.1 request
///
/// Headers are emitted exactly in the order supplied. The codec does not
/// compute `Content-Length`; a caller sending a non-empty body must
/// supply it explicitly, keeping the contract with the wire testable.
///
/// # Arguments
///
/// * `method` - Request method (`GET`, `POST`, ...)
/// * `path` - Request target path
/// * `host` - Value for the `Host` header
/// * `headers` - Additional headers, in emission order
/// * `body` - Optional request body appended after the blank line
pub fn build_request(
    method: &str,
    path: &str,
    host: &str,
    headers: &[(&str, &str)],
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut request = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", method, path, host).into_bytes();
    for (name, value) in headers {
        request.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    request.extend_from_slice(b"\r\n");
    if let Some(body) = body {
        request.extend_from_slice(body);
    }
    request
}

/// Reads one full response from the connection
///
/// Accumulates bytes until the `\r\n\r\n` header terminator appears,
/// parses the header block, then keeps reading until the declared
/// `Content-Length` worth of body has arrived.
///
/// # Returns
///
/// * `Ok(HttpResponse)` - A complete response, or one whose body was
///   truncated by the peer closing mid-body (see
///   [`HttpResponse::is_complete`])
/// * `Err(CodecError::ConnectionClosed)` - Peer closed before a full
///   header block arrived
/// * `Err(CodecError::Io)` - Stream error, including read-timeout expiry
pub fn receive_response<C: Connection + ?Sized>(conn: &mut C) -> Result<HttpResponse, CodecError> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = [0u8; RECV_BUFFER_SIZE];

    // Phase 1: accumulate until the header terminator is present
    let header_end = loop {
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        let n = conn.recv(&mut chunk)?;
        if n == 0 {
            return Err(CodecError::ConnectionClosed);
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let (status_code, status_text, headers, set_cookie) = parse_head(&head)?;

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let total = header_end + 4 + content_length;

    // Phase 2: accumulate the body; a peer close here yields whatever
    // arrived, truncated, which callers classify as a fetch failure
    while buffer.len() < total {
        let n = conn.recv(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    let body_end = total.min(buffer.len());
    let body = buffer[header_end + 4..body_end].to_vec();

    Ok(HttpResponse {
        status_code,
        status_text,
        headers,
        set_cookie,
        body,
    })
}

/// Finds the offset of the `\r\n\r\n` header terminator, if buffered
fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

type ParsedHead = (u16, String, HashMap<String, String>, Vec<String>);

/// Parses the status line and header block
fn parse_head(head: &str) -> Result<ParsedHead, CodecError> {
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let status_code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| CodecError::BadStatusLine(status_line.to_string()))?;
    let status_text = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    let mut set_cookie = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if name == "set-cookie" {
                set_cookie.push(value.clone());
            }
            headers.insert(name, value);
        }
    }

    Ok((status_code, status_text, headers, set_cookie))
}
