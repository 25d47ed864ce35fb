pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod invoker;
pub mod mcp;
pub mod models;
pub mod orchestrator;
pub mod ui;
