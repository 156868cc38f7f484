pub mod cli;
pub mod config;
pub mod hub;
pub mod logging;
pub mod merge;
pub mod metadata;
pub mod policy;
pub mod types;
