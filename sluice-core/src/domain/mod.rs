//! Core domain types
//!
//! These types are shared between the runner (which executes definitions)
//! and the monitor (which records executions and relays them to observers).

pub mod definition;
pub mod execution;
