//! Crawl engine
//!
//! This module contains the crawl logic proper:
//! - Per-page link/flag/token extraction from HTML
//! - Issuing a GET and classifying the outcome
//! - Frontier and visited-set bookkeeping (breadth-first)
//! - The coordinator loop tying them together

mod coordinator;
mod extract;
mod fetcher;
mod scheduler;

pub use coordinator::{CrawlReport, Crawler};
pub use extract::{extract_page, PageData};
pub use fetcher::{fetch_page, request_get, FetchOutcome};
pub use scheduler::CrawlState;
