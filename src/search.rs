//! Candidate search over the pending pool
//!
//! Pure functions: the match predicate and the candidate subset enumeration.
//! Neither performs external calls. Passing the predicate is necessary but
//! not sufficient for composition; the node's composer remains the authority
//! on whether a candidate actually composes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::intent::{Intent, ResourceProfile};

/// Candidate enumeration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// All unordered pairs from the pool whose profiles match.
    Pairwise,
    /// Every subset of size >= 2, in ascending bitmask order, with no
    /// profile filtering and no pruning after failures. Exponential in pool
    /// size; pools are expected to stay small in this mode.
    Subset,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::Pairwise => write!(f, "pairwise"),
            SearchStrategy::Subset => write!(f, "subset"),
        }
    }
}

/// Whether two profiles are mutually satisfiable: each side wants at least
/// one resource kind the other gives. Quantity balance and validity are
/// checked by the composer, not here.
pub fn profiles_match(a: &ResourceProfile, b: &ResourceProfile) -> bool {
    a.wants.intersection(&b.gives).next().is_some()
        && a.gives.intersection(&b.wants).next().is_some()
}

/// Enumerate the candidate subsets to try for one matching pass.
///
/// The order is deterministic for a given snapshot (snapshots are
/// payload-sorted). Never yields the empty set or a singleton.
pub fn candidate_subsets(snapshot: &[Intent], strategy: SearchStrategy) -> Vec<Vec<Intent>> {
    match strategy {
        SearchStrategy::Pairwise => pairwise_candidates(snapshot),
        SearchStrategy::Subset => subset_candidates(snapshot),
    }
}

fn pairwise_candidates(snapshot: &[Intent]) -> Vec<Vec<Intent>> {
    let mut candidates = Vec::new();
    for i in 0..snapshot.len() {
        for j in (i + 1)..snapshot.len() {
            if profiles_match(snapshot[i].profile(), snapshot[j].profile()) {
                candidates.push(vec![snapshot[i].clone(), snapshot[j].clone()]);
            }
        }
    }
    candidates
}

fn subset_candidates(snapshot: &[Intent]) -> Vec<Vec<Intent>> {
    let n = snapshot.len();
    let mut candidates = Vec::new();
    if n < 2 {
        return candidates;
    }
    for mask in 1u64..(1u64 << n) {
        if mask.count_ones() < 2 {
            continue;
        }
        let subset: Vec<Intent> = snapshot
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, intent)| intent.clone())
            .collect();
        candidates.push(subset);
    }
    candidates
}
