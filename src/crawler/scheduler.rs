//! Crawl state: frontier, visited set, and flag accumulation
//!
//! The frontier is strictly FIFO, which is what makes the traversal
//! breadth-first. A path enters the queue at most once overall:
//! membership is tested against visited-or-queued before enqueue, so a
//! path can be neither double-queued nor double-crawled.

use std::collections::{BTreeSet, HashSet, VecDeque};

/// Frontier, visited set, and collected flags for one crawl session
#[derive(Debug)]
pub struct CrawlState {
    /// Discovered-but-not-yet-fetched paths, FIFO
    frontier: VecDeque<String>,

    /// Every path ever enqueued (visited ∪ queued)
    seen: HashSet<String>,

    /// Paths already handed out for crawling
    visited: HashSet<String>,

    /// Distinct flags collected so far, never more than `quota`
    flags: BTreeSet<String>,

    /// Flag count at which the crawl stops
    quota: usize,
}

impl CrawlState {
    pub fn new(quota: usize) -> Self {
        Self {
            frontier: VecDeque::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
            flags: BTreeSet::new(),
            quota,
        }
    }

    /// Queues a path unless it was ever seen before
    ///
    /// Returns whether the path was actually enqueued.
    pub fn enqueue(&mut self, path: &str) -> bool {
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_string());
        self.frontier.push_back(path.to_string());
        true
    }

    /// Pops the earliest-enqueued path and marks it visited
    ///
    /// The visited re-check is defensive; `enqueue` already guarantees
    /// uniqueness.
    pub fn next_path(&mut self) -> Option<String> {
        while let Some(path) = self.frontier.pop_front() {
            if self.visited.contains(&path) {
                continue;
            }
            self.visited.insert(path.clone());
            return Some(path);
        }
        None
    }

    /// Records a flag; returns whether it was new
    ///
    /// Flags beyond the quota are not recorded — the crawl stops the
    /// moment the quota-th distinct flag lands.
    pub fn record_flag(&mut self, flag: &str) -> bool {
        if self.quota_reached() {
            return false;
        }
        self.flags.insert(flag.to_string())
    }

    pub fn quota_reached(&self) -> bool {
        self.flags.len() >= self.quota
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|f| f.as_str())
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
