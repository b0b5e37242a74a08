use std::collections::{HashSet, VecDeque};

/// FIFO queue of discovered, not yet claimed canonical URLs
///
/// Each URL is queued at most once while it sits in the frontier.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL; returns false if it is already queued
    pub fn push(&mut self, url: &str) -> bool {
        if !self.queued.insert(url.to_string()) {
            return false;
        }
        self.queue.push_back(url.to_string());
        true
    }

    /// Removes and returns the oldest URL
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.queue.into()
    }
}
