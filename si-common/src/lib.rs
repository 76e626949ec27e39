//! Shared building blocks for the sales insights pipeline
//!
//! Error type, configuration resolution, the taxonomy catalog and content
//! hashing: everything both library consumers and the pipeline binary need.

pub mod config;
pub mod error;
pub mod hash;
pub mod taxonomy;

pub use config::{PipelineConfig, TomlConfig};
pub use error::{Error, Result};
pub use hash::content_hash;
pub use taxonomy::TaxonomyCatalog;
