//! Bounded buffer of the helper's most recent output lines.

use std::collections::VecDeque;

/// Fixed-capacity line buffer; pushing into a full ring drops the oldest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LineRing {
    /// Creates an empty ring holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Oldest line first.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// Whether any retained line contains `marker`.
    pub fn contains(&self, marker: &str) -> bool {
        self.iter().any(|line| line.contains(marker))
    }
}
