//! Sales call insight extraction pipeline
//!
//! Fetches call transcripts, slices them into token-bounded chunks along
//! speaker-turn boundaries, sends each chunk to an LLM for structured insight
//! extraction, validates the output against a fixed taxonomy, and loads the
//! surviving insights into SQLite with content-addressed deduplication.
//! Large workloads go through the provider's asynchronous batch API with a
//! crash-resumable state file; small samples run through the chat API
//! directly.

pub mod db;
pub mod models;
pub mod pipeline;
pub mod services;
