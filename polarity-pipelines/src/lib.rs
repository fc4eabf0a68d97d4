pub mod cache;
pub mod sentiment;

pub use cache::PipelineCache;
pub use sentiment::{Sentiment, SentimentPipeline};
