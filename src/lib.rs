// ABOUTME: Main library entry point for the dojo academy backend
// ABOUTME: REST API for members, belt exams, subscription plans and fees
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Dojo Server
//!
//! A REST backend for running a martial-arts academy: member accounts with a
//! role hierarchy (athlete, instructor, admin), belt-progression exams with
//! scheduled sessions and recorded results, monthly subscription plans with
//! fee tracking, and pre-issued credentials gating instructor registration.
//!
//! ## Architecture
//!
//! - **Models**: domain structures shared by routes and storage
//! - **Database**: sqlx/SQLite storage split per domain
//! - **Auth**: HS256 JWT issuing/validation and the bearer middleware
//! - **Routes**: axum routers per resource, sharing `Arc<ServerResources>`
//! - **Config**: environment-driven server configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dojo_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Dojo server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod resources;
pub mod routes;
