// File: src/core/walker.rs
use crate::core::types::{Candidate, NormalizedChain, Token, SENTENCE_DELIMITER};
use crate::error::{Error, Result};
use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;

/// Source of the random draws used while walking a chain.
pub trait RandomSource {
    /// A uniform value in `[0, 1)`.
    fn uniform(&mut self) -> f64;
    /// A uniform index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;
}

impl RandomSource for ThreadRng {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

impl RandomSource for StdRng {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }

    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }
}

/// Weighted random walker over a normalized chain.
pub struct ChainWalker<'c, R = ThreadRng> {
    chain: &'c NormalizedChain,
    rng: R,
}

impl<'c> ChainWalker<'c, ThreadRng> {
    pub fn new(chain: &'c NormalizedChain) -> Self {
        Self::with_rng(chain, rand::thread_rng())
    }
}

impl<'c, R: RandomSource> ChainWalker<'c, R> {
    pub fn with_rng(chain: &'c NormalizedChain, rng: R) -> Self {
        Self { chain, rng }
    }

    /// Picks the token that follows `from_word`.
    ///
    /// Without a seed, any leader of the chain is picked uniformly. A seed that
    /// is not a leader fails with [`Error::UnknownToken`].
    pub fn next_word(&mut self, from_word: Option<&str>) -> Result<Token> {
        let Some(from_word) = from_word else {
            if self.chain.is_empty() {
                return Err(Error::EmptyChain);
            }
            let slot = self.rng.index(self.chain.len());
            return self
                .chain
                .leader_at(slot)
                .map(str::to_string)
                .ok_or(Error::EmptyChain);
        };

        let candidates = self
            .chain
            .candidates(from_word)
            .ok_or_else(|| Error::UnknownToken(from_word.to_string()))?;
        let target = self.rng.uniform();
        pick_weighted(candidates, target)
            .map(str::to_string)
            .ok_or_else(|| Error::UnknownToken(from_word.to_string()))
    }

    /// Lazily walks the chain from `from_word` until `stop_word` comes up.
    ///
    /// The stop word itself is never yielded. The iterator ends after the
    /// first error.
    pub fn generate_words<'w>(
        &'w mut self,
        from_word: Option<&str>,
        stop_word: Option<&str>,
    ) -> Words<'w, 'c, R> {
        Words {
            walker: self,
            current: from_word.map(str::to_string),
            stop_word: stop_word.map(str::to_string),
            done: false,
        }
    }

    /// Builds one sentence, walking from the sentence delimiter back to it.
    pub fn build_sentence(&mut self) -> Result<String> {
        let words = self
            .generate_words(Some(SENTENCE_DELIMITER), Some(SENTENCE_DELIMITER))
            .collect::<Result<Vec<_>>>()?;
        Ok(words.join(" "))
    }
}

/// Iterator returned by [`ChainWalker::generate_words`].
pub struct Words<'w, 'c, R> {
    walker: &'w mut ChainWalker<'c, R>,
    current: Option<Token>,
    stop_word: Option<Token>,
    done: bool,
}

impl<R: RandomSource> Iterator for Words<'_, '_, R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.walker.next_word(self.current.as_deref()) {
            Ok(word) => {
                if self.stop_word.as_deref() == Some(word.as_str()) {
                    self.done = true;
                    return None;
                }
                self.current = Some(word.clone());
                Some(Ok(word))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Scans candidates in order, returning the first whose running probability
/// sum reaches `target`. Rounding can leave the final sum just under 1.0, in
/// which case the last candidate is returned.
pub(crate) fn pick_weighted(candidates: &[Candidate], target: f64) -> Option<&str> {
    let mut total = 0.0_f64;
    for (word, probability) in candidates {
        total += *probability;
        if total >= target {
            return Some(word.as_str());
        }
    }
    candidates.last().map(|(word, _)| word.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain::{SentenceChainBuilder, WordChainBuilder};
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Replays fixed draws.
    struct FixedDraws {
        uniforms: Vec<f64>,
        indices: Vec<usize>,
    }

    impl RandomSource for FixedDraws {
        fn uniform(&mut self) -> f64 {
            self.uniforms.remove(0)
        }

        fn index(&mut self, len: usize) -> usize {
            self.indices.remove(0) % len
        }
    }

    fn pikard_chain() -> NormalizedChain {
        let mut builder = WordChainBuilder::new();
        builder.add_link("PIKARD", "Q");
        builder.add_link("PIKARD", "DORF");
        builder.add_link("PIKARD", "Q");
        builder.add_link("Q", "PIKARD");
        builder.add_link("DORF", "PIKARD");
        builder.normalize()
    }

    #[test]
    fn draw_on_boundary_picks_first_reaching_candidate() {
        let chain = pikard_chain();
        assert_eq!(
            chain.candidates("PIKARD").unwrap(),
            &[("Q".to_string(), 2.0 / 3.0), ("DORF".to_string(), 1.0 / 3.0)]
        );

        let draws = FixedDraws { uniforms: vec![2.0 / 3.0], indices: vec![] };
        let mut walker = ChainWalker::with_rng(&chain, draws);
        assert_eq!(walker.next_word(Some("PIKARD")).unwrap(), "Q");
    }

    #[test]
    fn draw_past_first_mass_picks_second() {
        let chain = pikard_chain();
        let draws = FixedDraws { uniforms: vec![0.7], indices: vec![] };
        let mut walker = ChainWalker::with_rng(&chain, draws);
        assert_eq!(walker.next_word(Some("PIKARD")).unwrap(), "DORF");
    }

    #[test]
    fn rounding_shortfall_falls_back_to_last_candidate() {
        let candidates = vec![("a".to_string(), 0.3), ("b".to_string(), 0.3)];
        assert_eq!(pick_weighted(&candidates, 0.99), Some("b"));
        assert_eq!(pick_weighted(&[], 0.5), None);
    }

    #[test]
    fn unseeded_draw_picks_a_leader() {
        let chain = pikard_chain();
        let draws = FixedDraws { uniforms: vec![], indices: vec![2] };
        let mut walker = ChainWalker::with_rng(&chain, draws);
        assert_eq!(walker.next_word(None).unwrap(), "DORF");
    }

    #[test]
    fn unknown_seed_is_an_error() {
        let chain = pikard_chain();
        let mut walker = ChainWalker::new(&chain);
        match walker.next_word(Some("STEVE")) {
            Err(Error::UnknownToken(token)) => assert_eq!(token, "STEVE"),
            other => panic!("expected unknown token, got {other:?}"),
        }
    }

    #[test]
    fn empty_chain_has_nothing_to_pick() {
        let chain = NormalizedChain::default();
        let mut walker = ChainWalker::new(&chain);
        assert!(matches!(walker.next_word(None), Err(Error::EmptyChain)));
    }

    #[test]
    fn generate_words_stops_before_stop_word() {
        let mut builder = WordChainBuilder::new();
        for word in ["start", "middle", "end"] {
            builder.add_next(word);
        }
        let chain = builder.normalize();
        let mut walker = ChainWalker::new(&chain);
        let words: Vec<String> = walker
            .generate_words(Some("start"), Some("end"))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(words, vec!["middle"]);
    }

    #[test]
    fn generate_words_surfaces_dead_end() {
        let mut builder = WordChainBuilder::new();
        builder.add_link("a", "b");
        let chain = builder.normalize();
        let mut walker = ChainWalker::new(&chain);
        let mut words = walker.generate_words(Some("a"), None);
        assert_eq!(words.next().unwrap().unwrap(), "b");
        assert!(matches!(words.next(), Some(Err(Error::UnknownToken(_)))));
        assert!(words.next().is_none());
    }

    #[test]
    fn sentences_are_legal_recombinations() {
        let mut builder = SentenceChainBuilder::new();
        builder.process_string("That would be illogical, Captain. There would be no profit.");
        let chain = builder.normalize();

        let possible: HashSet<&str> = HashSet::from([
            "That would be illogical, Captain.",
            "That would be no profit.",
            "There would be no profit.",
            "There would be illogical, Captain.",
        ]);
        let mut walker = ChainWalker::with_rng(&chain, StdRng::seed_from_u64(1701));
        for _ in 0..25 {
            let sentence = walker.build_sentence().unwrap();
            assert!(possible.contains(sentence.as_str()), "unexpected {sentence:?}");
        }
    }
}
