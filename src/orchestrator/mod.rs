//! Orchestrator module
//!
//! Provides the HTTP client and wire types for the orchestrator that owns the
//! task queue and the worker registry.

pub mod client;
pub mod models;

pub use client::OrchestratorClient;
pub use models::*;
