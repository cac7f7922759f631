//! The crawl loop
//!
//! Owns the connection, the cookie jar, and the crawl state, and runs
//! the breadth-first traversal from the authenticated landing page until
//! the flag quota is met or the frontier runs dry. Page-level failures
//! are logged and skipped; only a dead connection stops the crawl.

use crate::config::Config;
use crate::crawler::extract::{extract_page, PageData};
use crate::crawler::fetcher::{fetch_page, FetchOutcome};
use crate::crawler::scheduler::CrawlState;
use crate::http::{Connection, CookieJar};
use crate::{CrawlError, Result};

/// Final result of a crawl
#[derive(Debug)]
pub struct CrawlReport {
    /// Distinct flags found, in deterministic order
    pub flags: Vec<String>,

    /// Pages fetched during the crawl phase
    pub pages_crawled: usize,

    /// Whether the full quota was met
    pub complete: bool,
}

/// Breadth-first crawler over one authenticated connection
pub struct Crawler<C: Connection> {
    conn: C,
    jar: CookieJar,
    state: CrawlState,
    config: Config,
}

impl<C: Connection> Crawler<C> {
    /// Creates a crawler from an authenticated connection and cookie jar
    pub fn new(conn: C, jar: CookieJar, config: Config) -> Self {
        let state = CrawlState::new(config.crawler.flag_quota);
        Self {
            conn,
            jar,
            state,
            config,
        }
    }

    /// Runs the crawl, seeded from the landing page body
    ///
    /// The connection is closed before returning, on every path.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Quota met, or frontier exhausted first
    ///   (partial results; `complete` distinguishes the two)
    /// * `Err(CrawlError::ConnectionStalled)` - The connection stopped
    ///   making progress and the crawl cannot continue
    pub fn run(&mut self, landing_body: &str) -> Result<CrawlReport> {
        let scope = self.config.site.scope_prefix.clone();
        let seed = extract_page(landing_body, &scope);
        self.absorb(seed);

        let mut pages_crawled = 0usize;
        let mut consecutive_failures = 0u32;

        while !self.state.quota_reached() {
            let Some(path) = self.state.next_path() else {
                tracing::info!("Frontier exhausted after {} pages", pages_crawled);
                break;
            };

            match fetch_page(&mut self.conn, &self.config.site, &self.jar, &path) {
                FetchOutcome::Success(response) => {
                    consecutive_failures = 0;
                    pages_crawled += 1;
                    let page = extract_page(&response.body_text(), &scope);
                    self.absorb(page);
                    tracing::debug!(
                        "Crawled {} ({} flags, {} queued)",
                        path,
                        self.state.flag_count(),
                        self.state.frontier_len()
                    );
                }
                FetchOutcome::HttpError { status } => {
                    consecutive_failures = 0;
                    pages_crawled += 1;
                    tracing::warn!("Could not fetch {}: status {}", path, status);
                }
                FetchOutcome::Truncated => {
                    consecutive_failures = 0;
                    tracing::warn!("Response for {} truncated by peer, skipping", path);
                }
                FetchOutcome::Malformed(line) => {
                    consecutive_failures = 0;
                    tracing::warn!("Unparseable response for {} ({:?}), skipping", path, line);
                }
                FetchOutcome::Timeout => {
                    consecutive_failures = 0;
                    tracing::warn!("Timed out waiting for {}, skipping", path);
                }
                FetchOutcome::ConnectionFailed(message) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        "Connection failure on {} ({}), {} consecutive",
                        path,
                        message,
                        consecutive_failures
                    );
                    if consecutive_failures >= self.config.crawler.max_consecutive_failures {
                        let _ = self.conn.close();
                        return Err(CrawlError::ConnectionStalled {
                            failures: consecutive_failures,
                        });
                    }
                }
            }
        }

        let _ = self.conn.close();

        let complete = self.state.quota_reached();
        if complete {
            tracing::info!("All {} flags found", self.state.flag_count());
        } else {
            tracing::info!(
                "Crawl ended with {} of {} flags",
                self.state.flag_count(),
                self.config.crawler.flag_quota
            );
        }

        Ok(CrawlReport {
            flags: self.state.flags().map(String::from).collect(),
            pages_crawled,
            complete,
        })
    }

    /// Merges one page's extraction results into session state
    fn absorb(&mut self, page: PageData) {
        for flag in &page.flags {
            if self.state.record_flag(flag) {
                tracing::info!(
                    "Found flag {} of {}",
                    self.state.flag_count(),
                    self.config.crawler.flag_quota
                );
            }
        }
        for link in &page.links {
            self.state.enqueue(link);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A fake site answering raw HTTP over the Connection trait
    ///
    /// Unknown paths answer 500 so tests can exercise the per-page
    /// failure path; a dead site answers nothing at all.
    struct FakeSite {
        pages: HashMap<String, String>,
        buffer: Vec<u8>,
        requests: Vec<String>,
        dead: bool,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(p, b)| (p.to_string(), b.to_string()))
                    .collect(),
                buffer: Vec::new(),
                requests: Vec::new(),
                dead: false,
            }
        }

        fn dead() -> Self {
            let mut site = Self::new(&[]);
            site.dead = true;
            site
        }
    }

    impl Connection for FakeSite {
        fn send(&mut self, data: &[u8]) -> std::io::Result<()> {
            let request = String::from_utf8_lossy(data);
            let path = request
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();
            self.requests.push(path.clone());
            if self.dead {
                return Ok(());
            }
            self.buffer = match self.pages.get(&path) {
                Some(body) => format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                )
                .into_bytes(),
                None => b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n".to_vec(),
            };
            Ok(())
        }

        fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.buffer.len().min(buf.len());
            buf[..n].copy_from_slice(&self.buffer[..n]);
            self.buffer.drain(..n);
            Ok(n)
        }

        fn close(&mut self) -> std::io::Result<()> {
            self.buffer.clear();
            Ok(())
        }
    }

    fn link(path: &str) -> String {
        format!("<a href=\"{}\">x</a>", path)
    }

    fn test_config(quota: usize) -> Config {
        let mut config = Config::default();
        config.crawler.flag_quota = quota;
        config
    }

    #[test]
    fn test_breadth_first_traversal_order() {
        // seed -> B, C; B -> D. Order must be B, C, D, never B, D, C.
        let site = FakeSite::new(&[
            ("/fakebook/b/", &link("/fakebook/d/")),
            ("/fakebook/c/", ""),
            ("/fakebook/d/", ""),
        ]);
        let seed = format!("{}{}", link("/fakebook/b/"), link("/fakebook/c/"));

        let mut crawler = Crawler::new(site, CookieJar::new(), test_config(5));
        let report = crawler.run(&seed).unwrap();

        assert!(!report.complete);
        assert_eq!(
            crawler.conn.requests,
            vec!["/fakebook/b/", "/fakebook/c/", "/fakebook/d/"]
        );
    }

    #[test]
    fn test_500_page_does_not_abort_crawl() {
        // "/fakebook/bad/" is not in the fake, so it answers 500.
        let site = FakeSite::new(&[("/fakebook/good/", "<h3>FLAG: abc</h3>")]);
        let seed = format!("{}{}", link("/fakebook/bad/"), link("/fakebook/good/"));

        let mut crawler = Crawler::new(site, CookieJar::new(), test_config(5));
        let report = crawler.run(&seed).unwrap();

        assert_eq!(report.flags, vec!["abc"]);
        assert_eq!(
            crawler.conn.requests,
            vec!["/fakebook/bad/", "/fakebook/good/"]
        );
    }

    #[test]
    fn test_quota_stop_issues_no_further_requests() {
        let site = FakeSite::new(&[
            ("/fakebook/1/", "<h3>FLAG: one</h3>"),
            ("/fakebook/2/", "<h3>FLAG: two</h3>"),
            ("/fakebook/3/", "<h3>FLAG: three</h3>"),
        ]);
        let seed = format!(
            "{}{}{}",
            link("/fakebook/1/"),
            link("/fakebook/2/"),
            link("/fakebook/3/")
        );

        let mut crawler = Crawler::new(site, CookieJar::new(), test_config(2));
        let report = crawler.run(&seed).unwrap();

        assert!(report.complete);
        assert_eq!(report.flags.len(), 2);
        // The third page is still queued but must never be fetched.
        assert_eq!(crawler.conn.requests, vec!["/fakebook/1/", "/fakebook/2/"]);
    }

    #[test]
    fn test_duplicate_links_fetched_once() {
        // The page even links back to itself.
        let site = FakeSite::new(&[("/fakebook/1/", &link("/fakebook/1/"))]);
        let seed = format!("{}{}", link("/fakebook/1/"), link("/fakebook/1/"));

        let mut crawler = Crawler::new(site, CookieJar::new(), test_config(5));
        crawler.run(&seed).unwrap();

        assert_eq!(crawler.conn.requests, vec!["/fakebook/1/"]);
    }

    #[test]
    fn test_flag_on_seed_page_counts() {
        let site = FakeSite::new(&[]);
        let seed = "<h3>FLAG: from-seed</h3>".to_string();

        let mut crawler = Crawler::new(site, CookieJar::new(), test_config(1));
        let report = crawler.run(&seed).unwrap();

        assert!(report.complete);
        assert_eq!(report.flags, vec!["from-seed"]);
        assert!(crawler.conn.requests.is_empty());
    }

    #[test]
    fn test_dead_connection_stops_the_crawl() {
        let site = FakeSite::dead();
        let seed = format!(
            "{}{}{}{}",
            link("/fakebook/1/"),
            link("/fakebook/2/"),
            link("/fakebook/3/"),
            link("/fakebook/4/")
        );

        let mut crawler = Crawler::new(site, CookieJar::new(), test_config(5));
        let result = crawler.run(&seed);

        assert!(matches!(
            result,
            Err(CrawlError::ConnectionStalled { failures: 3 })
        ));
        // Stopped at the failure cap, not after draining the frontier.
        assert_eq!(crawler.conn.requests.len(), 3);
    }
}
