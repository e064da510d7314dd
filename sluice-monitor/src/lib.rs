//! Sluice Monitor
//!
//! Records pipeline executions reported by runners and pushes every change to
//! connected observers over a WebSocket.
//!
//! Architecture:
//! - Configuration: bind address and observer queue depth from the environment
//! - Services: the in-memory execution store and its broadcast hub
//! - API: HTTP control endpoints for runners, WebSocket endpoint for observers

pub mod api;
pub mod config;
pub mod service;
