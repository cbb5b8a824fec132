//! Example querying a question engine and running one session.
//!
//! This example shows how to:
//! - Load an engine definition from JSON
//! - Connect to the engine it names
//! - Start, drive and stop a question session
//!
//! Run with: `cargo run --example engine_info -- http://localhost:8080/om-qe/api`

use qengine_client::{EngineConfig, NormalizedResult, QuestionEngine, StartSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("qengine_client=debug")
        .init();

    let engine_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8080/om-qe/api".to_string());

    let mut config = EngineConfig::from_json(&format!(
        r#"{{
            "question_engines": ["{}"],
            "question_banks": ["http://localhost:8080/questions/"],
            "timeout": 2.5
        }}"#,
        engine_url
    ))?;
    let engine = QuestionEngine::connect(&mut config)?;
    println!("Using engine at {}", config.url_used.as_deref().unwrap_or("?"));

    println!("=== Engine info ===");
    match engine.get_engine_info(None).await? {
        NormalizedResult::Decoded(info) => println!("{:#}", info),
        NormalizedResult::Error { status, raw_body } => {
            println!("Engine replied {} with a non-JSON body:\n{}", status, raw_body);
            return Ok(());
        }
    }
    println!();

    println!("=== Session ===");
    let started = engine
        .start(StartSession::new("samples.mu120.module5.question01", "1.0").param("randomseed", "42"))
        .await?;
    let Some(session_id) = started
        .decoded()
        .and_then(|v| v["questionSession"].as_str())
        .map(str::to_string)
    else {
        println!("Could not start session: {}", started.into_value());
        return Ok(());
    };
    println!("Started session {}", session_id);

    let processed = engine
        .process(&session_id, &["omval_response1".to_string()], &["42".to_string()])
        .await?;
    println!("Process reply: {}", processed.into_value());

    let stopped = engine.stop(&session_id, None).await?;
    println!("Stop reply: {}", stopped.into_value());

    Ok(())
}
