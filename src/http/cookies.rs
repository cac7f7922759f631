//! Session and CSRF cookie jar
//!
//! The protocol only ever cares about two cookies, `sessionid` and
//! `csrftoken`; everything else the server sets is ignored. A later
//! `Set-Cookie` for the same name overwrites the earlier value (login
//! rotates both).

use crate::http::HttpResponse;
use std::collections::HashMap;

/// Cookie names the jar retains
const SESSION_COOKIE: &str = "sessionid";
const CSRF_COOKIE: &str = "csrftoken";

/// Holds the session and anti-forgery cookies for the crawl lifetime
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs every `Set-Cookie` occurrence from a response
    ///
    /// Each line is truncated at its first `;` (attributes like `Path`
    /// are irrelevant here), split into `name=value`, and stored when
    /// the name is one the protocol cares about.
    pub fn ingest(&mut self, response: &HttpResponse) {
        for line in &response.set_cookie {
            let pair = line.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if name == SESSION_COOKIE || name == CSRF_COOKIE {
                    tracing::debug!("Cookie jar: storing {}", name);
                    self.cookies.insert(name.to_string(), value.to_string());
                }
            }
        }
    }

    /// Looks up a held cookie value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|v| v.as_str())
    }

    /// Renders the `Cookie` header value, `sessionid` first
    ///
    /// Returns `None` when the jar is empty; the header must then be
    /// omitted from the request entirely.
    pub fn header_value(&self) -> Option<String> {
        let mut parts = Vec::new();
        for name in [SESSION_COOKIE, CSRF_COOKIE] {
            if let Some(value) = self.cookies.get(name) {
                parts.push(format!("{}={}", name, value));
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response_with_cookies(set_cookie: Vec<&str>) -> HttpResponse {
        HttpResponse {
            status_code: 200,
            status_text: "OK".to_string(),
            headers: HashMap::new(),
            set_cookie: set_cookie.into_iter().map(String::from).collect(),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_empty_jar_renders_nothing() {
        let jar = CookieJar::new();
        assert_eq!(jar.header_value(), None);
    }

    #[test]
    fn test_ingest_session_and_csrf() {
        let mut jar = CookieJar::new();
        jar.ingest(&response_with_cookies(vec![
            "sessionid=AAA; Path=/; HttpOnly",
            "csrftoken=BBB; Path=/",
        ]));
        assert_eq!(jar.get("sessionid"), Some("AAA"));
        assert_eq!(jar.get("csrftoken"), Some("BBB"));
        assert_eq!(jar.header_value().as_deref(), Some("sessionid=AAA; csrftoken=BBB"));
    }

    #[test]
    fn test_session_renders_before_csrf_regardless_of_arrival_order() {
        let mut jar = CookieJar::new();
        jar.ingest(&response_with_cookies(vec![
            "csrftoken=BBB; Path=/",
            "sessionid=AAA; Path=/",
        ]));
        assert_eq!(jar.header_value().as_deref(), Some("sessionid=AAA; csrftoken=BBB"));
    }

    #[test]
    fn test_later_value_overwrites_earlier() {
        let mut jar = CookieJar::new();
        jar.ingest(&response_with_cookies(vec!["sessionid=OLD; Path=/"]));
        jar.ingest(&response_with_cookies(vec!["sessionid=NEW; Path=/"]));
        assert_eq!(jar.get("sessionid"), Some("NEW"));
        assert_eq!(jar.header_value().as_deref(), Some("sessionid=NEW"));
    }

    #[test]
    fn test_irrelevant_cookies_ignored() {
        let mut jar = CookieJar::new();
        jar.ingest(&response_with_cookies(vec![
            "tracking=XYZ; Path=/",
            "sessionid=AAA",
        ]));
        assert_eq!(jar.get("tracking"), None);
        assert_eq!(jar.header_value().as_deref(), Some("sessionid=AAA"));
    }

    #[test]
    fn test_cookie_without_attributes() {
        let mut jar = CookieJar::new();
        jar.ingest(&response_with_cookies(vec!["csrftoken=ONLY"]));
        assert_eq!(jar.get("csrftoken"), Some("ONLY"));
    }
}
