//! snaplink - short-link issuance and resolution service
//!
//! Issues short codes for target URLs and resolves them back, with optional
//! expiry, password protection and one-time use. Every visit is recorded
//! through a single atomic update on the store, so one-time links resolve
//! exactly once even under concurrent access.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `storage`: `LinkStore` trait, SeaORM and in-memory backends
//! - `cache`: read-through cache over the store (moka or null)
//! - `services`: code generation, issuance, resolution, bulk, sweep
//! - `api`: HTTP handlers and middleware
//! - `interfaces`: CLI commands
//! - `config`: static configuration (`config.toml` + `SL__*` env)
//! - `runtime`: startup, shutdown and execution modes
//! - `system`: logging

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
