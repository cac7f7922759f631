//! Session bootstrap
//!
//! A fixed four-step sequence takes the connection from anonymous to an
//! authenticated session: fetch the root (session cookie), fetch the
//! login form (CSRF cookie + form token), submit credentials, fetch the
//! authenticated landing page. Bootstrap is all-or-nothing — there are
//! no retries, and any missing cookie or unexpected status is fatal,
//! because partial login state is useless.

use crate::config::Config;
use crate::crawler::{extract_page, request_get};
use crate::http::{build_request, receive_response, Connection, CookieJar};
use crate::{CrawlError, Result};
use std::fmt;

/// Login credentials from the command line
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The bootstrap state machine's steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStep {
    AnonRoot,
    LoginForm,
    Submit,
    Landing,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthStep::AnonRoot => "anonymous root fetch",
            AuthStep::LoginForm => "login form fetch",
            AuthStep::Submit => "credential submission",
            AuthStep::Landing => "landing page fetch",
        };
        f.write_str(name)
    }
}

/// Runs the login sequence to completion
///
/// On success the cookie jar holds the authenticated session cookies and
/// the returned string is the landing page body, which seeds the crawl.
///
/// # Errors
///
/// * `CrawlError::UnexpectedStatus` - The login form did not answer 200
/// * `CrawlError::MissingCookie` - A required cookie never arrived
/// * `CrawlError::MissingToken` - The login form carried no CSRF token
/// * `CrawlError::Codec` - The stream failed mid-bootstrap
pub fn authenticate<C: Connection + ?Sized>(
    conn: &mut C,
    config: &Config,
    jar: &mut CookieJar,
    credentials: &Credentials,
) -> Result<String> {
    let site = &config.site;
    let mut step = AuthStep::AnonRoot;
    let mut token: Option<String> = None;

    loop {
        tracing::debug!("Auth step: {}", step);
        match step {
            AuthStep::AnonRoot => {
                let response = request_get(conn, site, jar, &site.root_path)?;
                jar.ingest(&response);
                require_cookie(jar, "sessionid", step)?;
                step = AuthStep::LoginForm;
            }
            AuthStep::LoginForm => {
                let response = request_get(conn, site, jar, &site.login_path)?;
                if response.status_code != 200 {
                    return Err(CrawlError::UnexpectedStatus {
                        path: site.login_path.clone(),
                        status: response.status_code,
                    });
                }
                jar.ingest(&response);
                require_cookie(jar, "csrftoken", step)?;
                let page = extract_page(&response.body_text(), &site.scope_prefix);
                token = Some(page.csrf_token.ok_or(CrawlError::MissingToken)?);
                step = AuthStep::Submit;
            }
            AuthStep::Submit => {
                let token = token.take().ok_or(CrawlError::MissingToken)?;
                let body = format!(
                    "username={}&password={}&csrfmiddlewaretoken={}",
                    credentials.username, credentials.password, token
                );
                let content_length = body.len().to_string();
                let cookie = jar.header_value();

                let mut headers: Vec<(&str, &str)> = vec![
                    ("Content-Length", &content_length),
                    ("Content-Type", "application/x-www-form-urlencoded"),
                ];
                if let Some(value) = cookie.as_deref() {
                    headers.push(("Cookie", value));
                }

                let request = build_request(
                    "POST",
                    &site.login_path,
                    &site.host,
                    &headers,
                    Some(body.as_bytes()),
                );
                conn.send(&request)?;
                let response = receive_response(conn)?;

                // Login rotates both cookies; a response that rotates
                // neither means the credentials were rejected. The jar
                // still holds the stale values, so the check must be on
                // the response itself.
                jar.ingest(&response);
                require_rotated(&response, "sessionid", step)?;
                require_rotated(&response, "csrftoken", step)?;
                tracing::info!("Logged in as {}", credentials.username);
                step = AuthStep::Landing;
            }
            AuthStep::Landing => {
                let response = request_get(conn, site, jar, &site.scope_prefix)?;
                return Ok(response.body_text());
            }
        }
    }
}

fn require_cookie(jar: &CookieJar, name: &'static str, step: AuthStep) -> Result<()> {
    if jar.get(name).is_none() {
        return Err(CrawlError::MissingCookie {
            name,
            step: step.to_string(),
        });
    }
    Ok(())
}

/// Requires that this response itself set the named cookie
fn require_rotated(
    response: &crate::http::HttpResponse,
    name: &'static str,
    step: AuthStep,
) -> Result<()> {
    let prefix = format!("{}=", name);
    let rotated = response
        .set_cookie
        .iter()
        .any(|line| line.trim_start().starts_with(&prefix));
    if rotated {
        Ok(())
    } else {
        Err(CrawlError::MissingCookie {
            name,
            step: step.to_string(),
        })
    }
}
