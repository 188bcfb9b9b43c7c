//! services/api/src/lib.rs
//!
//! The HTTP/WebSocket service around the design core: Gemini adapters,
//! configuration and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
