pub mod heuristic;
pub mod http;

pub use heuristic::HeuristicScorer;
pub use http::HttpScorer;
