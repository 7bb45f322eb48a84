use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;

use daylog::{ChannelKind, LoggerConfig, Registry, Severity, TraceContext};

/// Configuration used when no config file is given on the command line
fn demo_config() -> LoggerConfig {
    LoggerConfig {
        path: PathBuf::from("./logs"),
        name: "demo".to_string(),
        service: true,
        trace: true,
        audit: true,
        format: "{asctime} {levelname} demo: {message}".to_string(),
        level: Severity::Info,
        backup_count: 1,
        delay: false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics about the logger itself go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "daylog=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => LoggerConfig::load(&PathBuf::from(path))?,
        None => demo_config(),
    };

    let registry = Arc::new(Registry::configure(&config).context("Failed to configure logging")?);
    tracing::info!("Logging to: {}", registry.dir().display());

    registry.service(Severity::Info, "test daylog");

    let span = TraceContext::new("12345678", "11111111")
        .with_parent("22222222")
        .with_timing(1234.0, 5678.0);
    registry.trace(Severity::Info, "trace daylog", Some(&span));

    registry.audit(Severity::Info, &json!({ "content": "测试" }));

    // Several tasks sharing the same channels
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || {
                registry.service(Severity::Info, &format!("worker {worker} started"));
                registry.emit(ChannelKind::Trace, Severity::Debug, "filtered out at info");
            })
        })
        .collect();
    for handle in handles {
        handle.await?;
    }

    let failed = registry.failed_emissions();
    if failed > 0 {
        tracing::warn!("{} log lines could not be written", failed);
    }

    Ok(())
}
