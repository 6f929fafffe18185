//! # fauxapi-core
//!
//! Core types and utilities for talking to a pfSense appliance through FauxAPI.
//!
//! This crate provides the shared error type, HTTP client settings, request
//! signing and the typed view over the appliance configuration document that
//! the client and alias-sync crates build on.
//!
//! ## Modules
//!
//! - [`error`] - Shared error type
//! - [`auth`] - `fauxapi-auth` request signing
//! - [`config`] - Connection configuration for a single appliance
//! - [`client`] - HTTP client settings and retry policy
//! - [`document`] - Configuration document and alias records
//! - [`query`] - Action query strings

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod query;

// Re-export commonly used types
pub use document::{AliasRecord, ConfigDocument};
pub use error::{Error, Result};
