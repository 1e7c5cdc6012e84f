//! SemiProcess MCP: semiconductor process analysis
//!
//! SPC capability, trend detection, FMEA-style defect risk and equipment
//! ranking, plus recipe, defect and shift helpers. Each analysis is exposed
//! as an MCP tool over stdio and as a `semiproc call` subcommand.

pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod input;
pub mod mcp;
pub mod report;
pub mod tools;
