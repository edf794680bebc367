pub mod api;
pub mod config;
pub mod error;
pub mod fetch_state;
pub mod issue;
pub mod metrics;
pub mod query;
pub mod site;
pub mod timestamp;
