//! FauxAPI client and data models.
//!
//! Provides typed structures and an asynchronous client for the management API
//! exposed by the FauxAPI package on pfSense appliances.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{FauxapiClient, FauxapiClientBuilder};
pub use models::{Action, ApiResponse, ConfigWriteParams, FunctionCall};

/// Convenient result alias that reuses the shared FauxAPI error type.
pub type Result<T> = fauxapi_core::Result<T>;
