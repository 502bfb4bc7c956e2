pub mod analysis;
pub mod config;
pub mod decision;
pub mod engine;
pub mod errors;
pub mod human;
pub mod model;
pub mod notify;
pub mod orchestrator;
pub mod queue;
pub mod workflow;
