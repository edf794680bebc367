/// Re-export `Config` from `seo-engine-core` for use within this crate.
///
/// Environment parsing lives in the core crate so tests can build a config
/// without touching the process environment.
pub use seo_engine_core::config::Config;
