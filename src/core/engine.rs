use crate::core::types::{NormalizedChain, SENTENCE_DELIMITER, SPEAKERS_CONTEXT};
use crate::core::walker::{ChainWalker, RandomSource};
use crate::error::{Error, Result};
use crate::learning::normalize_speaker;
use crate::persistence::ChainStore;
use rand::rngs::ThreadRng;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Picks speakers and generates their lines from a chain store.
///
/// Speaker chains are loaded lazily and kept for the chooser's lifetime.
pub struct DialogChooser<R = ThreadRng> {
    store: ChainStore,
    rng: R,
    speaker_chain: Option<NormalizedChain>,
    speaker_list: Option<Vec<String>>,
    dialog_chains: HashMap<String, NormalizedChain>,
    last_speaker: Option<String>,
}

impl DialogChooser<ThreadRng> {
    pub fn new(store: ChainStore) -> Self {
        Self::with_rng(store, rand::thread_rng())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ChainStore::open(path)?))
    }
}

impl<R: RandomSource> DialogChooser<R> {
    pub fn with_rng(store: ChainStore, rng: R) -> Self {
        Self {
            store,
            rng,
            speaker_chain: None,
            speaker_list: None,
            dialog_chains: HashMap::new(),
            last_speaker: None,
        }
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    /// Hands the store back, e.g. to close it explicitly.
    pub fn into_store(self) -> ChainStore {
        self.store
    }

    /// Every speaker with dialog, ascending.
    pub fn speakers(&self) -> Result<Vec<String>> {
        let mut speakers = self.store.get_contexts()?;
        speakers.retain(|context| context != SPEAKERS_CONTEXT);
        Ok(speakers)
    }

    /// Picks the next speaker.
    ///
    /// Continues from the previously chosen speaker along the speaker chain
    /// when that speaker leads any transition, so consecutive picks follow
    /// the learned speaker order. Otherwise every speaker with dialog is
    /// equally likely.
    pub fn random_speaker(&mut self) -> Result<String> {
        if self.speaker_chain.is_none() {
            self.speaker_chain = Some(self.store.to_chain(SPEAKERS_CONTEXT)?);
        }
        if self.speaker_list.is_none() {
            self.speaker_list = Some(self.speakers()?);
        }
        let (Some(chain), Some(speakers)) = (&self.speaker_chain, &self.speaker_list) else {
            return Err(Error::NoDialogFound);
        };
        if speakers.is_empty() {
            return Err(Error::NoDialogFound);
        }

        let speaker = match self.last_speaker.take() {
            Some(last) if chain.contains(&last) => {
                let next =
                    ChainWalker::with_rng(chain, &mut self.rng).next_word(Some(last.as_str()))?;
                debug!("speaker chain moved {} -> {}", last, next);
                next
            }
            _ => speakers[self.rng.index(speakers.len())].clone(),
        };
        self.last_speaker = Some(speaker.clone());
        Ok(speaker)
    }

    /// Generates one line, from `speaker` or from a randomly walked speaker.
    ///
    /// Returns `(speaker, line)`.
    pub fn random_dialog(&mut self, speaker: Option<&str>) -> Result<(String, String)> {
        let speaker = match speaker {
            Some(requested) => normalize_speaker(requested),
            None => self.random_speaker()?,
        };

        if !self.dialog_chains.contains_key(&speaker) {
            if !self.store.word_exists(&speaker, SENTENCE_DELIMITER)? {
                return Err(Error::SpeakerNotFound { speaker });
            }
            let chain = self.store.to_chain(&speaker)?;
            self.dialog_chains.insert(speaker.clone(), chain);
        }
        let chain = self
            .dialog_chains
            .get(&speaker)
            .ok_or_else(|| Error::SpeakerNotFound { speaker: speaker.clone() })?;

        let line = ChainWalker::with_rng(chain, &mut self.rng)
            .build_sentence()
            .map_err(|e| match e {
                Error::UnknownToken(_) | Error::EmptyChain => Error::SpeakerNotFound {
                    speaker: speaker.clone(),
                },
                other => other,
            })?;
        Ok((speaker, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::DialogLearner;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn learned_store(dialog: &[(&str, &str)]) -> ChainStore {
        let mut store = ChainStore::open_in_memory().unwrap();
        let mut learner = DialogLearner::new();
        learner.learn_all(dialog.iter().copied());
        learner.write_to(&mut store).unwrap();
        store
    }

    fn chooser(dialog: &[(&str, &str)]) -> DialogChooser<StdRng> {
        DialogChooser::with_rng(learned_store(dialog), StdRng::seed_from_u64(47))
    }

    #[test]
    fn unknown_speaker_is_reported_by_name() {
        let mut chooser = chooser(&[("PIKARD", "Engage."), ("DORF", "Aye, sir.")]);
        let err = chooser.random_dialog(Some("STEVE")).unwrap_err();
        assert!(err.is_no_dialog());
        assert_eq!(err.speaker(), Some("STEVE"));
        assert_eq!(err.to_string(), "Speaker \"STEVE\" has no known dialog.");
    }

    #[test]
    fn requested_speaker_is_case_insensitive() {
        let mut chooser = chooser(&[("PIKARD", "Engage."), ("DORF", "Aye, sir.")]);
        let (speaker, line) = chooser.random_dialog(Some("pikard")).unwrap();
        assert_eq!(speaker, "PIKARD");
        assert_eq!(line, "Engage.");
    }

    #[test]
    fn empty_store_has_no_dialog() {
        let store = ChainStore::open_in_memory().unwrap();
        let mut chooser = DialogChooser::with_rng(store, StdRng::seed_from_u64(1));
        assert!(matches!(chooser.random_dialog(None), Err(Error::NoDialogFound)));
        assert!(chooser.speakers().unwrap().is_empty());
    }

    #[test]
    fn random_speaker_follows_speaker_chain() {
        // PIKARD is always followed by DORF and DORF by PIKARD.
        let mut chooser = chooser(&[
            ("PIKARD", "Engage."),
            ("DORF", "Aye, sir."),
            ("PIKARD", "Make it so."),
            ("DORF", "Today is a good day to die."),
        ]);
        let first = chooser.random_speaker().unwrap();
        let second = chooser.random_speaker().unwrap();
        let third = chooser.random_speaker().unwrap();
        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn unprompted_dialog_comes_from_a_known_speaker() {
        let mut chooser = chooser(&[
            ("PIKARD", "Engage."),
            ("DORF", "Aye, sir."),
            ("PIKARD", "Make it so."),
        ]);
        for _ in 0..10 {
            let (speaker, line) = chooser.random_dialog(None).unwrap();
            match speaker.as_str() {
                "PIKARD" => assert!(line == "Engage." || line == "Make it so."),
                "DORF" => assert_eq!(line, "Aye, sir."),
                other => panic!("unexpected speaker {other}"),
            }
        }
        assert_eq!(chooser.speakers().unwrap(), vec!["DORF", "PIKARD"]);
    }

    #[test]
    fn single_line_store_still_picks_its_speaker() {
        let mut chooser = chooser(&[("PIKARD", "Make it so.")]);
        assert_eq!(chooser.speakers().unwrap(), vec!["PIKARD"]);
        let (speaker, line) = chooser.random_dialog(None).unwrap();
        assert_eq!(speaker, "PIKARD");
        assert_eq!(line, "Make it so.");
    }

    #[test]
    fn leader_only_speaker_is_still_picked() {
        // DORF never leads a speaker transition.
        let mut chooser = chooser(&[("PIKARD", "Engage."), ("DORF", "Aye, sir.")]);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let (speaker, _) = chooser.random_dialog(None).unwrap();
            seen.insert(speaker);
        }
        assert!(seen.contains("PIKARD"));
        assert!(seen.contains("DORF"));
    }
}
