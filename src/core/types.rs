// src/core/types.rs
use std::collections::HashMap;

/// A single chain token: a word (punctuation included) or the sentence delimiter.
pub type Token = String;

/// Reserved token that both starts and ends every sentence.
pub const SENTENCE_DELIMITER: &str = "";

/// Storage context holding the speaker-selection chain.
pub const SPEAKERS_CONTEXT: &str = "speakers";

/// A (follower, probability) edge out of one leader.
pub type Candidate = (Token, f64);

/// A chain whose follower counts have been turned into probabilities.
///
/// Leaders and their followers keep the order in which they were first seen,
/// which is the order the walker scans them in. There is no way to add links
/// to a normalized chain; build a new one with a chain builder instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedChain {
    leaders: Vec<(Token, Vec<Candidate>)>,
    index: HashMap<Token, usize>,
}

impl NormalizedChain {
    /// Assembles a chain from (leader, follower, weight) edges in order.
    /// Used when reconstructing a chain from stored rows.
    pub(crate) fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (Token, Token, f64)>,
    {
        let mut chain = Self::default();
        for (leader, follower, weight) in edges {
            let slot = match chain.index.get(&leader) {
                Some(&slot) => slot,
                None => {
                    let slot = chain.leaders.len();
                    chain.index.insert(leader.clone(), slot);
                    chain.leaders.push((leader, Vec::new()));
                    slot
                }
            };
            chain.leaders[slot].1.push((follower, weight));
        }
        chain
    }

    pub(crate) fn push_leader(&mut self, leader: Token, candidates: Vec<Candidate>) {
        self.index.insert(leader.clone(), self.leaders.len());
        self.leaders.push((leader, candidates));
    }

    /// Followers of `leader` in scan order, if the leader is known.
    pub fn candidates(&self, leader: &str) -> Option<&[Candidate]> {
        self.index
            .get(leader)
            .map(|&slot| self.leaders[slot].1.as_slice())
    }

    pub fn contains(&self, leader: &str) -> bool {
        self.index.contains_key(leader)
    }

    /// Leaders in first-seen order.
    pub fn leaders(&self) -> impl Iterator<Item = &str> {
        self.leaders.iter().map(|(leader, _)| leader.as_str())
    }

    /// Leader at position `slot` in first-seen order.
    pub fn leader_at(&self, slot: usize) -> Option<&str> {
        self.leaders.get(slot).map(|(leader, _)| leader.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Candidate])> {
        self.leaders
            .iter()
            .map(|(leader, candidates)| (leader.as_str(), candidates.as_slice()))
    }

    /// Every edge as a (leader, follower, weight) triple.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.iter().flat_map(|(leader, candidates)| {
            candidates
                .iter()
                .map(move |(follower, weight)| (leader, follower.as_str(), *weight))
        })
    }

    /// Number of leaders.
    pub fn len(&self) -> usize {
        self.leaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_edges_groups_by_leader_in_order() {
        let chain = NormalizedChain::from_edges(vec![
            ("a".to_string(), "b".to_string(), 0.5),
            ("b".to_string(), "a".to_string(), 1.0),
            ("a".to_string(), "c".to_string(), 0.5),
        ]);

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.leaders().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            chain.candidates("a").unwrap(),
            &[("b".to_string(), 0.5), ("c".to_string(), 0.5)]
        );
        assert!(chain.candidates("c").is_none());
        assert_eq!(chain.edges().count(), 3);
    }
}
