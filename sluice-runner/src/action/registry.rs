//! Action registry
//!
//! Static lookup table from `category/name` to an action and its compiled
//! schemas. Schemas are compiled at registration so that a broken schema is a
//! startup error rather than a per-call surprise.

use jsonschema::Validator;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::Action;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Action {0} is already registered")]
    Duplicate(String),

    #[error("Action name '{0}' must look like category/name")]
    InvalidName(String),

    #[error("Invalid {side} schema for {action}: {message}")]
    InvalidSchema {
        action: String,
        side: &'static str,
        message: String,
    },
}

/// An action together with its compiled input and output validators
pub struct RegisteredAction {
    action: Arc<dyn Action>,
    input: Validator,
    output: Validator,
}

impl RegisteredAction {
    pub fn action(&self) -> Arc<dyn Action> {
        Arc::clone(&self.action)
    }

    /// Returns every input violation, empty if the input is acceptable
    pub fn input_errors(&self, input: &JsonValue) -> Vec<String> {
        self.input.iter_errors(input).map(|e| e.to_string()).collect()
    }

    /// Returns every output violation, empty if the output is acceptable
    pub fn output_errors(&self, output: &JsonValue) -> Vec<String> {
        self.output.iter_errors(output).map(|e| e.to_string()).collect()
    }
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, RegisteredAction>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action under its own name
    pub fn register<A>(&mut self, action: A) -> Result<(), RegistryError>
    where
        A: Action + 'static,
    {
        self.register_arc(Arc::new(action))
    }

    pub fn register_arc(&mut self, action: Arc<dyn Action>) -> Result<(), RegistryError> {
        let name = action.name().to_string();

        if !is_namespaced(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.actions.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        let input = compile(&name, "input", &action.input_schema())?;
        let output = compile(&name, "output", &action.output_schema())?;

        debug!("Registered action {}", name);
        self.actions.insert(
            name,
            RegisteredAction {
                action,
                input,
                output,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredAction> {
        self.actions.get(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// `category/name`, both parts non-empty
pub fn is_namespaced(name: &str) -> bool {
    match name.split_once('/') {
        Some((category, action)) => {
            !category.is_empty() && !action.is_empty() && !action.contains('/')
        }
        None => false,
    }
}

fn compile(
    action: &str,
    side: &'static str,
    schema: &JsonValue,
) -> Result<Validator, RegistryError> {
    jsonschema::validator_for(schema).map_err(|e| RegistryError::InvalidSchema {
        action: action.to_string(),
        side,
        message: e.to_string(),
    })
}
