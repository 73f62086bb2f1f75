//! Attribute Store - remote end of the inline editor's RPC surface
//!
//! This crate provides the repository the inline editor writes to: an
//! actor-owned view of item attributes exposed as JSON-RPC over HTTP.

pub mod actors;
pub mod api;
pub mod config;
pub mod env;
