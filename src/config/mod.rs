// ABOUTME: Configuration module for environment-based server settings
// ABOUTME: Re-exports the environment configuration types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod environment;

pub use environment::{AuthConfig, DatabaseConfig, ServerConfig};
