//! Sluice Core
//!
//! Core types and abstractions for the Sluice pipeline runner and monitor.
//!
//! This crate contains:
//! - Domain types: pipeline definitions and their run-time executions
//! - DTOs: request/response bodies of the monitor's control API
//! - Events: the envelope pushed to observers
//! - View: observer-side reconstruction of executions from the event stream

pub mod domain;
pub mod dto;
pub mod event;
pub mod view;
