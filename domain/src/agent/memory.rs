//! Private, importance-ranked short-term memory.
//!
//! [`ShortTermMemory`] is a bounded buffer that evicts the *least important*
//! entry (earliest on ties) rather than the oldest one, until both the entry
//! count and the token estimate are back within limits.

use crate::core::string::estimate_tokens;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of recollection an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    Observation,
    Thought,
    Action,
    Feedback,
}

impl MemoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::Observation => "observation",
            MemoryCategory::Thought => "thought",
            MemoryCategory::Action => "action",
            MemoryCategory::Feedback => "feedback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// In `[0, 1]`; higher survives eviction longer.
    pub importance: f64,
    pub category: MemoryCategory,
}

impl MemoryEntry {
    pub fn new(content: impl Into<String>, importance: f64, category: MemoryCategory) -> Self {
        let importance = if importance.is_nan() {
            0.0
        } else {
            importance.clamp(0.0, 1.0)
        };
        Self {
            content: content.into(),
            timestamp: Utc::now(),
            importance,
            category,
        }
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.content)
    }
}

/// Capacity bounds for a [`ShortTermMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimits {
    pub max_entries: usize,
    pub max_tokens: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            max_entries: 30,
            max_tokens: 2_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShortTermMemory {
    entries: Vec<MemoryEntry>,
    limits: MemoryLimits,
    estimated_tokens: usize,
}

impl ShortTermMemory {
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            entries: Vec::new(),
            limits,
            estimated_tokens: 0,
        }
    }

    /// Insert an entry, then evict until both bounds hold.
    ///
    /// Returns the evicted entries in eviction order. The new entry itself
    /// may be evicted if it is the least important.
    pub fn push(&mut self, entry: MemoryEntry) -> Vec<MemoryEntry> {
        self.estimated_tokens += entry.estimated_tokens();
        self.entries.push(entry);

        let mut evicted = Vec::new();
        while self.over_limits() {
            match self.evict_least_important() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }

    fn over_limits(&self) -> bool {
        self.entries.len() > self.limits.max_entries
            || self.estimated_tokens > self.limits.max_tokens
    }

    fn evict_least_important(&mut self) -> Option<MemoryEntry> {
        let mut victim: Option<usize> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            match victim {
                Some(v) if entry.importance >= self.entries[v].importance => {}
                _ => victim = Some(i),
            }
        }
        let entry = self.entries.remove(victim?);
        self.estimated_tokens = self.estimated_tokens.saturating_sub(entry.estimated_tokens());
        Some(entry)
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

/// Everything an agent keeps to itself.
///
/// Owned by exactly one executor and dropped with it.
#[derive(Debug, Clone)]
pub struct AgentPrivateContext {
    pub memory: ShortTermMemory,
    pub goal: String,
    pub long_term: Vec<String>,
}

impl AgentPrivateContext {
    pub fn new(limits: MemoryLimits, goal: impl Into<String>) -> Self {
        Self {
            memory: ShortTermMemory::new(limits),
            goal: goal.into(),
            long_term: Vec::new(),
        }
    }

    pub fn remember(
        &mut self,
        content: impl Into<String>,
        importance: f64,
        category: MemoryCategory,
    ) -> Vec<MemoryEntry> {
        self.memory.push(MemoryEntry::new(content, importance, category))
    }
}
