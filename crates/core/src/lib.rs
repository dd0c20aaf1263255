//! Core types for toolshed: tool provisioning, process invocation,
//! configuration and error handling.

pub mod command;
pub mod config;
pub mod error;
pub mod paths;
pub mod tools;

pub use error::{Error, Result};
