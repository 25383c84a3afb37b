//! Configuration and catalogue
//!
//! Shared types, JSON config loading, built-in puzzle presets and startup
//! validation.

pub mod config;
pub mod presets;
pub mod types;
pub mod validator;
