//! objstor CLI library
//!
//! This module exports the CLI components for use in integration tests.

pub mod commands;
pub mod exit_code;
pub mod invocation;
pub mod output;
pub mod sniff;
