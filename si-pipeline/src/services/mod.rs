//! Pipeline services

pub mod batch;
pub mod chunker;
pub mod direct;
pub mod gateway;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod state;

pub use batch::BatchOrchestrator;
pub use chunker::Chunker;
pub use direct::DirectProcessor;
pub use gateway::{GatewayError, InferenceGateway, OpenAiGateway};
pub use parser::InsightParser;
pub use retry::RetryPolicy;
pub use state::StateStore;
