// File: src/core/chain.rs
use crate::core::types::{NormalizedChain, Token, SENTENCE_DELIMITER};
use std::collections::HashMap;

// --- WordChainBuilder: accumulates raw transition counts ---

#[derive(Debug, Clone)]
struct LeaderNode {
    token: Token,
    /// Follower counts in first-seen order.
    followers: Vec<(Token, u64)>,
    slots: HashMap<Token, usize>,
}

impl LeaderNode {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            followers: Vec::new(),
            slots: HashMap::new(),
        }
    }

    fn bump(&mut self, follower: &str) {
        if let Some(&slot) = self.slots.get(follower) {
            self.followers[slot].1 += 1;
        } else {
            self.slots.insert(follower.to_string(), self.followers.len());
            self.followers.push((follower.to_string(), 1));
        }
    }
}

/// Markov chain builder for streams of words.
///
/// Every builder owns its counts; build one per context (one per speaker,
/// one for speaker selection) and normalize it once ingestion is done.
#[derive(Debug, Clone, Default)]
pub struct WordChainBuilder {
    nodes: Vec<LeaderNode>,
    index: HashMap<Token, usize>,
    last_token: Option<Token>,
}

impl WordChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one leader -> follower transition.
    /// O(1) amortized complexity.
    pub fn add_link(&mut self, leader: &str, follower: &str) {
        let node_idx = if let Some(&idx) = self.index.get(leader) {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(LeaderNode::new(leader));
            self.index.insert(leader.to_string(), idx);
            idx
        };
        self.nodes[node_idx].bump(follower);
        self.last_token = Some(follower.to_string());
    }

    /// Adds a transition from whatever token was supplied last.
    /// The very first token has no leader, so only its position is recorded.
    pub fn add_next(&mut self, follower: &str) {
        match self.last_token.take() {
            Some(leader) => self.add_link(&leader, follower),
            None => self.last_token = Some(follower.to_string()),
        }
    }

    /// Raw count recorded for one edge, zero when absent.
    pub fn count(&self, leader: &str, follower: &str) -> u64 {
        self.index
            .get(leader)
            .and_then(|&idx| {
                let node = &self.nodes[idx];
                node.slots.get(follower).map(|&slot| node.followers[slot].1)
            })
            .unwrap_or(0)
    }

    /// Number of distinct leaders seen so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Converts the accumulated counts into per-leader probabilities.
    ///
    /// The builder is left untouched; calling this again after more links
    /// have been added produces a fresh chain reflecting the new counts.
    pub fn normalize(&self) -> NormalizedChain {
        let mut chain = NormalizedChain::default();
        for node in &self.nodes {
            let total: u64 = node.followers.iter().map(|(_, count)| count).sum();
            let candidates = node
                .followers
                .iter()
                .map(|(follower, count)| (follower.clone(), *count as f64 / total as f64))
                .collect();
            chain.push_leader(node.token.clone(), candidates);
        }
        chain
    }
}

// --- SentenceChainBuilder: word chain with sentence boundaries ---

/// Chain builder that brackets every sentence with [`SENTENCE_DELIMITER`].
#[derive(Debug, Clone, Default)]
pub struct SentenceChainBuilder {
    chain: WordChainBuilder,
}

impl SentenceChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link(&mut self, leader: &str, follower: &str) {
        self.chain.add_link(leader, follower);
    }

    pub fn add_next(&mut self, follower: &str) {
        self.chain.add_next(follower);
    }

    /// Splits `text` on whitespace and links consecutive words.
    ///
    /// The delimiter leads the first word and every word that ends a
    /// sentence, and follows each sentence end. A string whose last word does
    /// not end a sentence still gets a closing link to the delimiter.
    pub fn process_string(&mut self, text: &str) {
        let mut last_word = SENTENCE_DELIMITER;
        for word in text.split_whitespace() {
            self.chain.add_link(last_word, word);
            last_word = word;
            if ends_sentence(word) {
                self.chain.add_link(word, SENTENCE_DELIMITER);
                last_word = SENTENCE_DELIMITER;
            }
        }

        if last_word != SENTENCE_DELIMITER {
            self.chain.add_link(last_word, SENTENCE_DELIMITER);
        }
    }

    pub fn count(&self, leader: &str, follower: &str) -> u64 {
        self.chain.count(leader, follower)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn normalize(&self) -> NormalizedChain {
        self.chain.normalize()
    }
}

/// A word ends a sentence when its last character is `.`, `!` or `?` and it
/// is not made only of periods (so a bare `...` keeps the sentence going).
fn ends_sentence(word: &str) -> bool {
    word.ends_with(&['.', '!', '?'][..]) && word.chars().any(|c| c != '.')
}
