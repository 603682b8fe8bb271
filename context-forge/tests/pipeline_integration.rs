//! End-to-end tests: import, statistics, context and model hand-off.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use context_forge::config::PipelineConfig;
use context_forge::error::{ForgeError, Result};
use context_forge::model::{ParsedData, SamplingStrategy, ANALYTICS_SYSTEM_PROMPT};
use context_forge::pipeline::{AnalysisModel, DataPipeline, ImportEvent, ImportStage};

const REGIONS: [&str; 4] = ["north", "south", "east", "west"];

fn sales_csv(rows: usize) -> String {
    let mut content = String::from("region,revenue,note\n");
    for i in 0..rows {
        content.push_str(&format!(
            "{},{},order number {i} shipped\n",
            REGIONS[i % REGIONS.len()],
            100 + i
        ));
    }
    content
}

async fn import_ok(pipeline: &DataPipeline, name: &str, content: String) -> ParsedData {
    let mut events = pipeline.import(name, content, None);
    while let Some(event) = events.next().await {
        match event {
            ImportEvent::Success { data, .. } => return data,
            ImportEvent::Error(err) => panic!("import failed: {err}"),
            ImportEvent::Progress { .. } => {}
        }
    }
    panic!("import ended without a terminal event");
}

struct EchoModel {
    seen: Mutex<Option<(String, String)>>,
}

#[async_trait]
impl AnalysisModel for EchoModel {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| ForgeError::model("lock poisoned"))?;
        *seen = Some((system_prompt.to_string(), user_message.to_string()));
        Ok(format!("{} chars received", user_message.chars().count()))
    }
}

#[tokio::test]
async fn test_csv_import_to_model_round() {
    let pipeline = DataPipeline::default();
    let data = Arc::new(import_ok(&pipeline, "sales.csv", sales_csv(800)).await);
    assert_eq!(data.total_row_count, 800);

    let stats = pipeline.compute_statistics(Arc::clone(&data)).await.unwrap();
    let context = pipeline.build_context(&data, Some(&stats));

    assert_eq!(
        SamplingStrategy::for_row_count(data.total_row_count),
        SamplingStrategy::Statistical
    );
    assert!(context.schema_description.contains("- revenue: Integer"));
    assert!(context.statistics_summary.contains("Sampling: STATISTICAL"));
    assert!(context.statistics_summary.contains("  region (String):"));
    assert!(context.statistics_summary.contains("    - Unique values: 4"));
    assert!(context.statistics_summary.contains("    - Min: 100.0"));
    assert!(context
        .data_sample
        .starts_with("(Sampled 100 rows from dataset)\n\nregion | revenue | note\n"));
    assert!(context.estimated_tokens <= 3000);

    let model = EchoModel {
        seen: Mutex::new(None),
    };
    let answer = pipeline
        .analyze(&model, &context, "Which region has the highest revenue?")
        .await
        .unwrap();
    assert!(answer.ends_with("chars received"));

    let (system, user) = model.seen.lock().unwrap().clone().unwrap();
    assert_eq!(system, ANALYTICS_SYSTEM_PROMPT);
    assert!(user.starts_with("=== DATA CONTEXT ===\n\n"));
    assert!(user.contains("=== USER QUESTION ===\n\nWhich region has the highest revenue?\n"));
    assert!(!user.contains("You are a data analyst assistant."));
}

#[tokio::test]
async fn test_json_and_log_imports() {
    let pipeline = DataPipeline::default();

    let json = r#"[{"id":1,"user":{"plan":"pro"}},{"id":2,"user":{"plan":"free"}}]"#;
    let data = import_ok(&pipeline, "users.json", json.to_string()).await;
    assert_eq!(data.schema.column_names(), vec!["id", "user.plan"]);

    let log = "[info] boot\n[error] disk full\nwarn: retrying\n";
    let data = import_ok(&pipeline, "app.log", log.to_string()).await;
    assert_eq!(data.total_row_count, 3);
    assert_eq!(data.rows[1].get("level"), Some("ERROR"));
}

#[tokio::test]
async fn test_failed_import_emits_no_success() {
    let pipeline = DataPipeline::default();
    let events: Vec<ImportEvent> = pipeline
        .import("broken.json", "[{\"a\": ", None)
        .collect()
        .await;

    assert!(events.iter().all(|e| !matches!(e, ImportEvent::Success { .. })));
    match events.last() {
        Some(ImportEvent::Error(err)) => assert_eq!(err.to_string(), "No JSON objects found"),
        other => panic!("expected error, got {other:?}"),
    }
    assert!(!events.iter().any(|e| matches!(
        e,
        ImportEvent::Progress {
            stage: ImportStage::Validating,
            ..
        }
    )));
}

#[tokio::test]
async fn test_dropping_import_stream_is_harmless() {
    let config = PipelineConfig::builder().progress_channel_capacity(1).build();
    let pipeline = DataPipeline::new(config);

    let mut events = pipeline.import("big.csv", sales_csv(5000), None);
    let first = events.next().await;
    assert!(matches!(
        first,
        Some(ImportEvent::Progress {
            stage: ImportStage::Reading,
            ..
        })
    ));
    drop(events);

    // The pipeline stays usable for the next import
    let data = import_ok(&pipeline, "small.csv", sales_csv(3)).await;
    assert_eq!(data.total_row_count, 3);
}

#[tokio::test]
async fn test_context_is_deterministic_per_seed() {
    let content = sales_csv(900);
    let first = DataPipeline::default();
    let second = DataPipeline::default();

    let a = import_ok(&first, "a.csv", content.clone()).await;
    let b = import_ok(&second, "b.csv", content.clone()).await;
    assert_eq!(first.build_context(&a, None), second.build_context(&b, None));

    let reseeded = DataPipeline::new(PipelineConfig::builder().sampling_seed(7).build());
    let c = import_ok(&reseeded, "c.csv", content).await;
    assert_ne!(
        first.build_context(&a, None).data_sample,
        reseeded.build_context(&c, None).data_sample
    );
}

#[tokio::test]
async fn test_config_document_drives_pipeline() {
    let config = PipelineConfig::from_json_str(r#"{"max_preview_rows": 10}"#).unwrap();
    let pipeline = DataPipeline::new(config);

    let data = import_ok(&pipeline, "sales.csv", sales_csv(50)).await;
    assert_eq!(data.rows.len(), 10);
    assert_eq!(data.total_row_count, 50);
    assert!(data.is_sampled);
}
