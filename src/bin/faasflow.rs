use std::path::PathBuf;

use clap::{Parser, Subcommand};
use faasflow::cli::{check_flow, load_flow_file, parse_trigger_kind, plugin_names};
use faasflow::plugin::PluginKind;
use faasflow::utils::LoggingConfig;
use faasflow::StepValue;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "faasflow", version, about = "FaasFlow CLI", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered trigger and provider plugins
    Plugins,
    /// Load and mount a flow document
    Check { file: PathBuf },
    /// Dispatch a flow document once
    Run {
        file: PathBuf,
        #[arg(long)]
        trigger: Option<String>,
        #[arg(long, default_value = "null")]
        event: String,
        #[arg(long, default_value = "{}")]
        context: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plugins => handle_plugins(),
        Command::Check { file } => handle_check(file).await?,
        Command::Run {
            file,
            trigger,
            event,
            context,
        } => handle_run(file, trigger, &event, &context).await?,
    }
    Ok(())
}

fn handle_plugins() {
    let names = plugin_names();
    if names.is_empty() {
        println!("No plugins registered");
        return;
    }
    println!("{:<10} {}", "Kind", "Name");
    for entry in names {
        let kind = match entry.kind {
            PluginKind::Trigger => "trigger",
            PluginKind::Provider => "provider",
        };
        println!("{:<10} {}", kind, entry.name);
    }
}

async fn handle_check(file: PathBuf) -> anyhow::Result<()> {
    let flow = load_flow_file(&file)?;
    let summary = check_flow(&flow).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn handle_run(
    file: PathBuf,
    trigger: Option<String>,
    event: &str,
    context: &str,
) -> anyhow::Result<()> {
    let flow = load_flow_file(&file)?;
    let event: Value = serde_json::from_str(event)?;
    let context: Value = serde_json::from_str(context)?;

    let entry = flow.create_trigger(parse_trigger_kind(trigger.as_deref()));
    let result = entry.call(event, context).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let StepValue::Failure(failure) = result {
        anyhow::bail!("step failed: {failure}");
    }
    Ok(())
}
