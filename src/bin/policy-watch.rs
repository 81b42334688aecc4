//! Thin CLI entry point: loads a JSON list of `MonitorSource`s, wires a
//! `BatchScheduler`, triggers one manual batch over every source, and prints
//! a summary of the resulting reports.

use std::env;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use policy_watch_core::config::RuntimeConfig;
use policy_watch_core::scheduler::{BatchScheduler, ProgressEvent, TriggerRequest};
use policy_watch_core::types::{MonitorSource, TriggerKind};
use policy_watch_core::{browser::BrowserTool, llm::LlmClient, orchestrator::Orchestrator};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let sources_path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: policy-watch <sources.json>");
            return ExitCode::FAILURE;
        }
    };

    let config = match RuntimeConfig::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let sources = match load_sources(&sources_path) {
        Ok(sources) => sources,
        Err(err) => {
            eprintln!("failed to load sources from {sources_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    if sources.is_empty() {
        eprintln!("{sources_path} contains no sources");
        return ExitCode::FAILURE;
    }

    let llm = Arc::new(LlmClient::from_config(&config));
    let browser = Arc::new(BrowserTool::new(
        config.agent_max_concurrency,
        config.per_host_pacing,
        config.browse_timeout,
        config.page_text_cap,
    ));
    let orchestrator = Arc::new(Orchestrator::new(llm, browser.clone(), config.clone()));
    let scheduler = BatchScheduler::new(orchestrator, config);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let progress_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_progress(&event);
        }
    });

    let (batch, outcomes) = scheduler
        .trigger(
            TriggerRequest {
                sources,
                trigger_kind: TriggerKind::Manual,
            },
            tx,
        )
        .await;

    drop(progress_task);
    browser.shutdown().await;

    println!("batch {} completed with {} task(s):", batch.batch_id, outcomes.len());
    for outcome in &outcomes {
        println!(
            "  source_id={} status={:?} items={}",
            outcome.task.source_id, outcome.task.status, outcome.task.items_found
        );
        if let Some(report) = &outcome.report {
            println!("    report: {}", report.title);
        }
    }

    ExitCode::SUCCESS
}

fn load_sources(path: &str) -> anyhow::Result<Vec<MonitorSource>> {
    let raw = fs::read_to_string(path)?;
    let sources: Vec<MonitorSource> = serde_json::from_str(&raw)?;
    Ok(sources)
}

fn log_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::TaskStarted { task_id, source_id, .. } => {
            log::info!("task {task_id} started for source {source_id}");
        }
        ProgressEvent::TaskProgress { task_id, items_so_far, .. } => {
            log::debug!("task {task_id} progress: {items_so_far} item(s) so far");
        }
        ProgressEvent::TaskCompleted { task_id, status, items_found, .. } => {
            log::info!("task {task_id} completed: {status:?}, {items_found} item(s)");
        }
    }
}
