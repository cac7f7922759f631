//! Raw HTTP/1.1 over a byte stream
//!
//! This module contains everything below the crawl logic:
//! - The `Connection` byte-stream abstraction and its TLS implementation
//! - Request rendering and response reassembly (the message codec)
//! - The session/CSRF cookie jar

mod codec;
mod cookies;
mod transport;

pub use codec::{build_request, receive_response, HttpResponse};
pub use cookies::CookieJar;
pub use transport::{Connection, TlsConnection};

#[cfg(test)]
pub(crate) use codec::tests::ScriptedConnection;
