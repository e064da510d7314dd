//! Pipelines loaded from disk

use serde_json::json;
use sluice_runner::definition::PIPELINE_SUFFIX;
use sluice_runner::{Config, DefinitionError, DefinitionSource, DirectorySource, Engine};
use std::path::PathBuf;

fn shipped_pipelines() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../pipelines")
}

fn offline_engine(dir: impl Into<PathBuf>) -> Engine {
    let config = Config::default()
        .with_monitor_url("")
        .with_pipelines_dir(dir);
    Engine::from_config(&config).unwrap()
}

#[tokio::test]
async fn shipped_math_chain_runs() {
    let engine = offline_engine(shipped_pipelines());

    let outcome = engine.run("math-chain", json!({ "value": 3 }), "test").await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(
        outcome.result.unwrap(),
        json!({
            "steps": {
                "double": { "output": { "value": 6 } },
                "square": { "output": { "value": 36 } }
            }
        })
    );
}

#[tokio::test]
async fn shipped_content_report_runs() {
    let engine = offline_engine(shipped_pipelines());

    let outcome = engine
        .run(
            "content-report",
            json!({ "text": "pipes carry water", "title": "Plumbing" }),
            "test",
        )
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    let result = outcome.result.unwrap();
    assert_eq!(
        result["steps"]["count"]["output"],
        json!({ "words": 3, "characters": 17 })
    );
    let markdown = result["steps"]["report"]["output"]["markdown"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(markdown.starts_with("# Plumbing\n\n"));
    assert!(markdown.contains("## Characters\n\n17\n"));
    assert!(markdown.contains("## Summary\n\n3 words, 17 characters\n"));
}

#[tokio::test]
async fn title_is_optional() {
    let engine = offline_engine(shipped_pipelines());

    let outcome = engine
        .run("content-report", json!({ "text": "untitled" }), "test")
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
}

#[tokio::test]
async fn directory_source_reads_written_definitions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(format!("twice{}", PIPELINE_SUFFIX)),
        r#"
name: twice
steps:
  - id: first
    action: math/double
    input: { value: "{{ input.value }}" }
  - id: second
    action: math/double
    input: { value: "{{ steps.first.output.value }}" }
"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a pipeline").unwrap();

    let source = DirectorySource::new(dir.path());
    assert_eq!(source.names().unwrap(), vec!["twice"]);

    let outcome = offline_engine(dir.path())
        .run("twice", json!({ "value": 5 }), "test")
        .await;
    assert_eq!(outcome.result.unwrap()["steps"]["second"]["output"]["value"], 20);
}

#[tokio::test]
async fn invalid_definitions_are_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(format!("dup{}", PIPELINE_SUFFIX)),
        concat!(
            "name: dup\n",
            "steps:\n",
            "  - { id: a, action: math/double }\n",
            "  - { id: a, action: math/square }\n",
        ),
    )
    .unwrap();
    std::fs::write(
        dir.path().join(format!("garbled{}", PIPELINE_SUFFIX)),
        "name: garbled\nsteps: nope\n",
    )
    .unwrap();

    let source = DirectorySource::new(dir.path());
    assert!(matches!(
        source.load("dup").await,
        Err(DefinitionError::Invalid { .. })
    ));
    assert!(matches!(
        source.load("garbled").await,
        Err(DefinitionError::Parse { .. })
    ));
    assert!(matches!(
        source.load("absent").await,
        Err(DefinitionError::NotFound(_))
    ));

    let outcome = offline_engine(dir.path()).run("dup", json!({}), "test").await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("duplicate step id"));
}
