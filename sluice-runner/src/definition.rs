//! Pipeline definition sources
//!
//! A definition is loaded by name right before a run starts. Any problem
//! loading it (missing, unreadable, malformed, structurally invalid) is a
//! [`DefinitionError`] and the run never begins.

use async_trait::async_trait;
use sluice_core::domain::definition::PipelineDefinition;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::action::is_namespaced;

/// File suffix of pipeline definitions inside a directory source
pub const PIPELINE_SUFFIX: &str = ".pipeline.yaml";

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Pipeline not found: {0}")]
    NotFound(String),

    #[error("Failed to read pipeline {name} from {path}: {source}")]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pipeline {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid pipeline {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Where pipeline definitions come from
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    async fn load(&self, name: &str) -> Result<PipelineDefinition, DefinitionError>;
}

/// Reads `<dir>/<name>.pipeline.yaml`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, PIPELINE_SUFFIX))
    }

    /// Names of every definition in the directory, sorted
    pub fn names(&self) -> std::io::Result<Vec<String>> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|f| f.strip_suffix(PIPELINE_SUFFIX))
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl DefinitionSource for DirectorySource {
    async fn load(&self, name: &str) -> Result<PipelineDefinition, DefinitionError> {
        // Names are file stems, never paths
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(DefinitionError::NotFound(name.to_string()));
        }

        let path = self.path_for(name);
        debug!("Loading pipeline {} from {}", name, path.display());

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DefinitionError::NotFound(name.to_string()));
            }
            Err(source) => {
                return Err(DefinitionError::Read {
                    name: name.to_string(),
                    path,
                    source,
                });
            }
        };

        parse(name, &content)
    }
}

/// In-memory definitions keyed by pipeline name
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    definitions: HashMap<String, PipelineDefinition>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, definition: PipelineDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn insert(&mut self, definition: PipelineDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }
}

#[async_trait]
impl DefinitionSource for StaticSource {
    async fn load(&self, name: &str) -> Result<PipelineDefinition, DefinitionError> {
        let definition = self
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::NotFound(name.to_string()))?;
        validate(&definition)?;
        Ok(definition)
    }
}

/// Parses and validates a YAML definition
pub fn parse(name: &str, content: &str) -> Result<PipelineDefinition, DefinitionError> {
    let definition: PipelineDefinition =
        serde_yaml::from_str(content).map_err(|source| DefinitionError::Parse {
            name: name.to_string(),
            source,
        })?;
    validate(&definition)?;
    Ok(definition)
}

/// Checks step ids are present and unique and actions are `category/name`
pub fn validate(definition: &PipelineDefinition) -> Result<(), DefinitionError> {
    let invalid = |reason: String| DefinitionError::Invalid {
        name: definition.name.clone(),
        reason,
    };

    let mut seen = HashSet::new();
    for (index, step) in definition.steps.iter().enumerate() {
        if step.id.trim().is_empty() {
            return Err(invalid(format!("step #{} has an empty id", index + 1)));
        }
        if !seen.insert(step.id.as_str()) {
            return Err(invalid(format!("duplicate step id '{}'", step.id)));
        }
        if !is_namespaced(&step.action) {
            return Err(invalid(format!(
                "step '{}' has action '{}', expected category/name",
                step.id, step.action
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::domain::definition::Step;

    const CHAIN: &str = r#"
name: math-chain
version: "1.0"
description: Double then square
steps:
  - id: a
    action: math/double
    input:
      value: "{{ input.value }}"
  - id: b
    action: math/square
    input:
      value: "{{ steps.a.output.value }}"
"#;

    fn step(id: &str, action: &str) -> Step {
        Step {
            id: id.to_string(),
            action: action.to_string(),
            input: serde_json::json!({}),
        }
    }

    fn definition(steps: Vec<Step>) -> PipelineDefinition {
        PipelineDefinition {
            name: "p".to_string(),
            version: String::new(),
            description: String::new(),
            steps,
        }
    }

    #[test]
    fn test_parse_yaml() {
        let def = parse("math-chain", CHAIN).unwrap();

        assert_eq!(def.name, "math-chain");
        assert_eq!(def.version, "1.0");
        assert_eq!(def.steps.len(), 2);
        assert_eq!(def.steps[1].input["value"], "{{ steps.a.output.value }}");
    }

    #[test]
    fn test_parse_error() {
        let err = parse("broken", "name: [unterminated").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }

    #[test]
    fn test_validation() {
        assert!(validate(&definition(vec![step("a", "math/double")])).is_ok());
        assert!(validate(&definition(vec![])).is_ok());

        let dup = validate(&definition(vec![step("a", "math/double"), step("a", "math/square")]));
        match dup {
            Err(DefinitionError::Invalid { reason, .. }) => assert!(reason.contains("duplicate")),
            other => panic!("expected a duplicate id error, got {:?}", other),
        }

        assert!(validate(&definition(vec![step(" ", "math/double")])).is_err());
        assert!(validate(&definition(vec![step("a", "double")])).is_err());
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new().with(PipelineDefinition {
            name: "one".to_string(),
            ..definition(vec![step("a", "math/double")])
        });

        assert_eq!(source.load("one").await.unwrap().steps.len(), 1);
        assert!(matches!(
            source.load("two").await,
            Err(DefinitionError::NotFound(name)) if name == "two"
        ));
    }

    #[tokio::test]
    async fn test_directory_source_rejects_paths() {
        let source = DirectorySource::new(".");
        assert!(matches!(
            source.load("../etc/passwd").await,
            Err(DefinitionError::NotFound(_))
        ));
    }
}
