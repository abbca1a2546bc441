pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod logging;
pub mod lookup;
pub mod parser;
pub mod pipeline;
pub mod reconciler;
pub mod storage;
pub mod types;
