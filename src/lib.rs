//! LRCLIB lyric upload pipeline - shared modules for the binary and tests.

pub mod archive;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod locator;
pub mod lyrics;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod pow;
pub mod progress;
pub mod prompt;
pub mod safety;
pub mod scoring;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
