use std::collections::VecDeque;

use super::moves::{ArcChange, ArcPair};
use super::neighborhood::Candidate;
use crate::utils::normalize_arc;

/// Arcs removed by the most recent moves; re-adding them is forbidden for `tenure` moves.
#[derive(Debug, Clone)]
pub struct TabuList {
    entries: VecDeque<Vec<ArcPair>>,
    tenure: usize,
}

impl TabuList {
    pub fn new(tenure: usize) -> Self {
        TabuList {
            entries: VecDeque::with_capacity(tenure + 1),
            tenure,
        }
    }

    pub fn tenure(&self) -> usize {
        self.tenure
    }

    pub fn set_tenure(&mut self, tenure: usize) {
        self.tenure = tenure;
        self.entries.truncate(tenure);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, arc: ArcPair) -> bool {
        let arc = normalize_arc(arc.0, arc.1);
        self.entries.iter().any(|entry| entry.contains(&arc))
    }

    /// A move is tabu when it puts back any recently removed arc.
    pub fn is_tabu(&self, change: &ArcChange) -> bool {
        change
            .added
            .iter()
            .any(|&(from, to)| from != to && self.contains((from, to)))
    }

    pub fn insert_and_adjust(&mut self, change: &ArcChange) {
        let removed: Vec<ArcPair> = change
            .removed
            .iter()
            .filter(|(from, to)| from != to)
            .map(|&(from, to)| normalize_arc(from, to))
            .collect();

        self.entries.push_front(removed);
        while self.entries.len() > self.tenure {
            self.entries.pop_back();
        }
    }
}

/// Pick the best-ranked move that is not tabu, unless a tabu move beats the best
/// distance seen so far (aspiration).
///
/// Arc changes are only materialized for the candidates inspected; the winner's
/// is returned alongside it.
pub fn choose_best_candidate<'a>(
    candidates: &'a [Candidate],
    tabu_list: &TabuList,
    current_distance: u64,
    best_distance: u64,
    change_of: impl Fn(&Candidate) -> ArcChange,
) -> Option<(&'a Candidate, ArcChange)> {
    candidates.iter().find_map(|candidate| {
        let change = change_of(candidate);
        let aspiration = (current_distance as i64 + candidate.delta) < best_distance as i64;
        (aspiration || !tabu_list.is_tabu(&change)).then_some((candidate, change))
    })
}
