// File: src/learning.rs
use crate::core::chain::{SentenceChainBuilder, WordChainBuilder};
use crate::core::types::{NormalizedChain, SPEAKERS_CONTEXT};
use crate::error::Result;
use crate::persistence::ChainStore;
use std::collections::HashMap;
use tracing::{debug, info};

/// Learns per-speaker dialog chains plus the chain of who speaks next.
#[derive(Debug, Default)]
pub struct DialogLearner {
    speakers: WordChainBuilder,
    dialog: Vec<(String, SentenceChainBuilder)>,
    slots: HashMap<String, usize>,
    lines: usize,
}

impl DialogLearner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learns one line of dialog. Blank lines are ignored entirely.
    pub fn learn(&mut self, speaker: &str, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let speaker = normalize_speaker(speaker);
        if speaker.is_empty() {
            return;
        }

        self.speakers.add_next(&speaker);

        let slot = match self.slots.get(&speaker) {
            Some(&slot) => slot,
            None => {
                let slot = self.dialog.len();
                self.slots.insert(speaker.clone(), slot);
                self.dialog.push((speaker, SentenceChainBuilder::new()));
                slot
            }
        };
        self.dialog[slot].1.process_string(line);
        self.lines += 1;
    }

    /// Learns every (speaker, line) pair in order.
    pub fn learn_all<I, S, L>(&mut self, dialog: I)
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: AsRef<str>,
    {
        for (speaker, line) in dialog {
            self.learn(speaker.as_ref(), line.as_ref());
        }
    }

    /// Lines learned so far.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Speakers in first-seen order.
    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.dialog.iter().map(|(speaker, _)| speaker.as_str())
    }

    /// Normalized chains keyed by context: the speaker chain first, then one
    /// per speaker.
    pub fn normalize(&self) -> Vec<(String, NormalizedChain)> {
        let mut chains = Vec::with_capacity(self.dialog.len() + 1);
        chains.push((SPEAKERS_CONTEXT.to_string(), self.speakers.normalize()));
        for (speaker, builder) in &self.dialog {
            debug!("{} has {} distinct leaders", speaker, builder.len());
            chains.push((speaker.clone(), builder.normalize()));
        }
        chains
    }

    /// Replaces the contents of `store` with everything learned so far.
    pub fn write_to(&self, store: &mut ChainStore) -> Result<usize> {
        let chains = self.normalize();
        let rows = store.rebuild(
            chains
                .iter()
                .map(|(context, chain)| (context.as_str(), chain)),
        )?;
        info!(
            "learned {} lines from {} speakers",
            self.lines,
            self.dialog.len()
        );
        Ok(rows)
    }
}

/// Speaker names are stored trimmed and upper-cased.
pub fn normalize_speaker(speaker: &str) -> String {
    speaker.trim().to_uppercase()
}
