pub mod api;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod context;
pub mod controller;
pub mod errors;
pub mod events_out;
pub mod executor;
pub mod gate;
pub mod generator;
pub mod types;

pub use context::AppContext;
