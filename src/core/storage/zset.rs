// src/core/storage/zset.rs

//! A minimal sorted-set representation: a member → score map plus an
//! on-demand ordered view.

use bytes::Bytes;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    members: IndexMap<Bytes, f64>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a member. Returns `true` if the member was new.
    pub fn insert(&mut self, member: Bytes, score: f64) -> bool {
        self.members.insert(member, score).is_none()
    }

    pub fn score(&self, member: &Bytes) -> Option<f64> {
        self.members.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members ordered by (score, member), the canonical sorted-set order.
    pub fn sorted_members(&self) -> Vec<(Bytes, f64)> {
        let mut entries: Vec<(Bytes, f64)> =
            self.members.iter().map(|(m, s)| (m.clone(), *s)).collect();
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }

    pub fn memory_usage(&self) -> usize {
        self.members
            .iter()
            .map(|(m, _)| m.len() + std::mem::size_of::<f64>())
            .sum()
    }
}
