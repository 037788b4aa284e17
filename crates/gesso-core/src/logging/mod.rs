//! Logging utilities.
//!
//! This module centralizes logger initialization and nothing else; runtime
//! code logs through the standard `log` facade so embedders can substitute
//! their own backend.

mod init;

pub use init::{LoggingConfig, init_logging};
