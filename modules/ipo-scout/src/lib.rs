pub mod collector;
pub mod extractor;
pub mod pipeline;
pub mod prompts;
pub mod publisher;
pub mod scheduler;
pub mod summarizer;

pub use collector::{Article, Collector};
pub use extractor::Extractor;
pub use pipeline::{Pipeline, RunReport};
pub use publisher::Publisher;
pub use scheduler::Scheduler;
pub use summarizer::Summarizer;
