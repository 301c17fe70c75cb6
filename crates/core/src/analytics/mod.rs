pub mod aggregator;
pub mod user_agent;

pub use aggregator::{aggregate, VisitorStatsAggregator};
pub use user_agent::{classify, ClientLabels};
