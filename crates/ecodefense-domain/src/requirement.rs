//! Requirement queue - compliance obligations awaiting a response

use serde::{Deserialize, Serialize};

/// Ordered requirements awaiting a response
///
/// Order is document order. Removing an entry shifts the ones after it down
/// by one and never reorders anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementQueue {
    items: Vec<String>,
}

impl RequirementQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue from already-split requirements
    pub fn from_requirements(items: Vec<String>) -> Self {
        Self { items }
    }

    /// Number of pending requirements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a requirement by position
    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    /// Append a manually entered requirement
    pub fn push(&mut self, requirement: impl Into<String>) {
        self.items.push(requirement.into());
    }

    /// Remove the requirement at `index`, keeping the rest in order
    ///
    /// Returns `None` when the index is out of range.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Drop every pending requirement
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate over pending requirements in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Borrow the pending requirements as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}
