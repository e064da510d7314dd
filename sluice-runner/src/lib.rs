//! Sluice Runner
//!
//! Runs named pipelines step by step on behalf of a caller.
//!
//! Architecture:
//! - Template: resolves `{{ path }}` placeholders in step inputs
//! - Action: registry of schema-validated actions and the gateway that invokes them
//! - Actions: the built-in action catalog
//! - Definition: where pipeline definitions are loaded from
//! - Engine: the sequential execution loop, reporting progress as it goes
//!
//! Progress is pushed through a [`sluice_client::Reporter`]; reporting never
//! changes the outcome of a run.

pub mod action;
pub mod actions;
pub mod config;
pub mod definition;
pub mod engine;
pub mod template;

pub use action::{Action, ActionContext, ActionGateway, ActionRegistry, ActionResult};
pub use config::Config;
pub use definition::{DefinitionError, DefinitionSource, DirectorySource, StaticSource};
pub use engine::{Engine, RunOutcome};
