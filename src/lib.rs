pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod sink;
pub mod sources;
