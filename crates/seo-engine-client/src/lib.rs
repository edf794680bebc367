pub mod cli;
pub mod config;
pub mod coordinator;
pub mod export;
pub mod http;
pub mod issues;
pub mod registry;
pub mod render;
pub mod sources;
pub mod state;
