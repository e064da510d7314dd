//! Data Transfer Objects for inter-service communication
//!
//! Request and response bodies of the monitor's control API, shared by the
//! monitor (which serves them) and the client (which sends them).

pub mod execution;
