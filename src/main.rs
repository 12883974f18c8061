use agent_tools::cli::{Cli, Commands};
use agent_tools::{utils, CallContext, CallToolParams, MCPServer, Settings, ToolRegistry};
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::new()?;
    init_tracing(&settings.logging.level);

    let registry = Arc::new(ToolRegistry::with_defaults(&settings)?);

    // Ctrl+C cancels the call in flight and ends `serve`.
    let ctx = CallContext::new();
    let cancel = ctx.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::List => handle_list(&registry),
        Commands::Schema { name } => handle_schema(&registry, &name),
        Commands::Call { name, args } => handle_call(&registry, &ctx, name, args).await,
        Commands::Serve => handle_serve(registry, &ctx).await,
    }
}

/// Logs go to stderr so stdout stays free for results and the MCP channel.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_list(registry: &ToolRegistry) -> Result<()> {
    utils::print_header("Available tools");
    let tools = registry.list_tools();
    for descriptor in &tools {
        println!("{}", descriptor);
    }
    utils::print_info(&format!("\n{} tools registered", tools.len()));
    Ok(())
}

fn handle_schema(registry: &ToolRegistry, name: &str) -> Result<()> {
    let tool = registry
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("unknown tool: {}", name))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&tool.descriptor().input_schema)?
    );
    Ok(())
}

async fn handle_call(
    registry: &ToolRegistry,
    ctx: &CallContext,
    name: String,
    args: String,
) -> Result<()> {
    let result = registry.call(ctx, CallToolParams::new(name.clone(), args)).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.is_error {
        utils::print_error(&format!("Tool '{}' reported an error", name));
        anyhow::bail!("tool '{}' failed", name);
    }
    Ok(())
}

async fn handle_serve(registry: Arc<ToolRegistry>, ctx: &CallContext) -> Result<()> {
    let server = MCPServer::new(registry);
    server
        .serve(ctx, BufReader::new(io::stdin()), io::stdout())
        .await
}
