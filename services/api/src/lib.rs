//! services/api/src/lib.rs
//!
//! Library crate for the API service: configuration, error types, the
//! PostgreSQL adapter, and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
