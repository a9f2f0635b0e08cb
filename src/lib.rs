// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod logging;
pub mod persistence;

pub use crate::core::chain::{SentenceChainBuilder, WordChainBuilder};
pub use crate::core::engine::DialogChooser;
pub use crate::core::types::{NormalizedChain, Token, SENTENCE_DELIMITER, SPEAKERS_CONTEXT};
pub use crate::core::walker::{ChainWalker, RandomSource};
pub use crate::error::{Error, Result};
pub use crate::learning::DialogLearner;
pub use crate::persistence::ChainStore;
