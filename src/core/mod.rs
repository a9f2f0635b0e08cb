// src/core/mod.rs
pub mod chain;
pub mod engine;
pub mod types;
pub mod walker;
