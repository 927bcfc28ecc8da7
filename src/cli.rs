//! Client subcommands of the binary.
//!
//! These talk to a running bridge over HTTP, the same way a browser UI would.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::BridgeClient;
use crate::config::{AppConfig, Command};
use crate::domain::{Credential, Run, RunStatus};
use crate::export;
use crate::form;
use crate::watch::RunWatcher;

/// Execute a client subcommand. `Serve` is handled by the caller.
pub async fn execute(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Serve => bail!("serve is not a client command"),
        Command::Actors => list_actors(&client(config)?).await,
        Command::Schema { actor_id } => show_schema(&client(config)?, &actor_id).await,
        Command::Run {
            actor_id,
            input,
            input_file,
            export,
        } => {
            let client = client(config)?;
            let input = match (input, input_file) {
                (Some(raw), _) => parse_input(&raw)?,
                (None, Some(path)) => read_input(&path).await?,
                (None, None) => {
                    let schema = client.actor_schema(&actor_id).await?;
                    Value::Object(form::initial_input(&schema))
                }
            };
            run_actor(client, config, &actor_id, &input, export.as_deref()).await
        }
    }
}

fn client(config: &AppConfig) -> Result<BridgeClient> {
    let credential = config
        .client
        .api_key
        .as_deref()
        .and_then(Credential::new)
        .context("API key is required (set APIFY_TOKEN or pass --api-key)")?;
    Ok(BridgeClient::new(&config.client.bridge_url, credential)?)
}

fn parse_input(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("--input is not valid JSON")
}

async fn read_input(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn list_actors(client: &BridgeClient) -> Result<()> {
    let actors = client.list_actors().await?;
    if actors.is_empty() {
        println!("No actors found.");
        return Ok(());
    }
    for actor in actors {
        println!("{}  {}", actor.id, actor.display_name());
        if let Some(description) = &actor.description {
            println!("    {description}");
        }
    }
    Ok(())
}

async fn show_schema(client: &BridgeClient, actor_id: &str) -> Result<()> {
    let schema = client.actor_schema(actor_id).await?;
    let fields = form::fields(&schema);
    if fields.is_empty() {
        println!("This actor does not require any input parameters.");
        return Ok(());
    }

    let initial = form::initial_input(&schema);
    for field in fields {
        let marker = if field.required { " *" } else { "" };
        println!("{}{marker} ({})", field.label, field.key);
        println!("    widget: {}", widget_name(&field.widget));
        if let Some(description) = &field.description {
            println!("    {description}");
        }
        if let Some(value) = initial.get(&field.key) {
            let shown = form::display_value(field.kind, value);
            if !shown.is_empty() {
                println!("    default: {}", shown.replace('\n', "\n             "));
            }
        }
    }
    Ok(())
}

fn widget_name(widget: &form::Widget) -> String {
    match widget {
        form::Widget::Select { options } => {
            let options: Vec<String> = options.iter().map(Value::to_string).collect();
            format!("select [{}]", options.join(", "))
        }
        form::Widget::Text => "text".to_string(),
        form::Widget::Numeric => "number".to_string(),
        form::Widget::Checkbox => "checkbox".to_string(),
        form::Widget::LineList => "list (one per line)".to_string(),
        form::Widget::JsonEditor => "json".to_string(),
    }
}

async fn run_actor(
    client: BridgeClient,
    config: &AppConfig,
    actor_id: &str,
    input: &Value,
    export_dir: Option<&Path>,
) -> Result<()> {
    println!("Running {actor_id}...");
    let mut latest = client.run_actor(actor_id, input).await?;
    report(&latest);

    let watcher = RunWatcher::new(Arc::new(client), config.polling.interval());
    let cancel = watcher.cancellation();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut updates = watcher.watch(&latest);
    while let Some(update) = updates.next().await {
        latest = update?;
        report(&latest);
    }
    ctrl_c.abort();

    if latest.status.is_in_progress() {
        warn!(name: "run.watch.cancelled", run_id = %latest.run_id, "Stopped following run");
        println!("Stopped following run {}. It keeps running upstream.", latest.run_id);
        return Ok(());
    }

    if latest.status != RunStatus::Succeeded {
        let reason = latest.error.as_deref().unwrap_or("Actor run did not succeed");
        bail!("Run {} ended {}: {reason}", latest.run_id, latest.status);
    }

    if let Some(dir) = export_dir {
        let path = export::write(&latest, dir)
            .await
            .with_context(|| format!("Failed to export to {}", dir.display()))?;
        info!(name: "run.exported", run_id = %latest.run_id, path = %path.display(), "Run output exported");
        println!("Exported to {}", path.display());
    } else if let Some(output) = &latest.output {
        println!("{}", serde_json::to_string_pretty(output)?);
    }
    Ok(())
}

fn report(run: &Run) {
    match (&run.error, &run.message, &run.output) {
        (Some(error), _, _) => println!("[{}] {}: {error}", run.run_id, run.status),
        (None, Some(message), _) => println!("[{}] {}: {message}", run.run_id, run.status),
        (None, None, Some(output)) => {
            println!("[{}] {}: {} item(s)", run.run_id, run.status, output.len());
        }
        (None, None, None) => println!("[{}] {}", run.run_id, run.status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input_rejects_invalid_json() {
        assert_eq!(parse_input(r#"{"q": 1}"#).unwrap(), json!({ "q": 1 }));
        assert!(parse_input("{q: 1}").is_err());
    }

    #[tokio::test]
    async fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        tokio::fs::write(&path, r#"{"urls": ["https://example.com"]}"#)
            .await
            .unwrap();

        let input = read_input(&path).await.unwrap();
        assert_eq!(input, json!({ "urls": ["https://example.com"] }));
    }

    #[test]
    fn test_widget_name() {
        assert_eq!(
            widget_name(&form::Widget::Select {
                options: vec![json!("US"), json!("DE")]
            }),
            r#"select ["US", "DE"]"#
        );
        assert_eq!(widget_name(&form::Widget::LineList), "list (one per line)");
    }
}
