//! Core types, config, errors, and wire protocol for tileboard.

pub mod config;
pub mod error;
pub mod protocol;
