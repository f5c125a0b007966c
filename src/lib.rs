//! Pick Scoring & Lifecycle Pipeline.
//!
//! Exposes the core modules for use by the `betterbot` binary and by
//! tests. Everything a caller needs to run the pipeline end to end
//! lives under `domain`, `scoring`, `slate`, `sources`, `store`,
//! `grader`, `scheduler`, `time_et`, `config`, `errors`, and `pipeline`.

pub mod config;
pub mod domain;
pub mod errors;
pub mod grader;
pub mod pipeline;
pub mod scheduler;
pub mod scoring;
pub mod slate;
pub mod sources;
pub mod store;
pub mod time_et;
