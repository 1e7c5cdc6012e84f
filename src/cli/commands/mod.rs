//! CLI command implementations

pub mod call;
pub mod completions;
pub mod config;
pub mod init;
pub mod serve;
pub mod tools;
