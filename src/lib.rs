pub mod common;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pages;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod vocabulary;
