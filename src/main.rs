use anyhow::{Context, Result};
use chatrelay::{ChatMessage, KeyPoolStats, ProviderId, Router};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Route chat prompts across Gemini, DeepSeek, Claude and OpenAI
#[derive(Debug, Parser)]
#[command(name = "chatrelay", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one prompt and print the result as JSON
    Ask(AskArgs),
    /// List configured providers
    Providers(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Config file to load instead of the default search path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct AskArgs {
    /// Provider to ask first
    #[arg(long, short, default_value = "gemini")]
    provider: String,

    /// System prompt
    #[arg(long, short, default_value = "")]
    system: String,

    /// Answer with the offline reply instead of failing
    #[arg(long)]
    offline_fallback: bool,

    #[command(flatten)]
    config: ConfigArgs,

    /// The user message
    prompt: String,
}

fn load_router(args: &ConfigArgs) -> Result<Router> {
    let router = match &args.config {
        Some(path) => Router::with_config_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Router::new().context("loading default config")?,
    };
    Ok(router)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ask(args) => {
            let provider: ProviderId = args.provider.parse()?;
            let router = load_router(&args.config)?;
            let messages = [ChatMessage::user(args.prompt)];

            let result = if args.offline_fallback {
                router
                    .call_or_offline(provider, &messages, &args.system)
                    .await
            } else {
                router.call(provider, &messages, &args.system).await?
            };

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Providers(args) => {
            let router = load_router(&args)?;
            for id in router.providers() {
                let Some(info) = router.provider_info(id) else {
                    continue;
                };
                let stats = router.pool_stats(id);
                let stats = stats.unwrap_or(KeyPoolStats {
                    total_keys: 0,
                    available_keys: 0,
                    rate_limited_keys: 0,
                    total_requests: 0,
                });
                println!(
                    "{:<9} has_keys={:<5} keys={} available={} rate_limited={} model={:<28} {}",
                    info.id.as_str(),
                    info.has_keys,
                    stats.total_keys,
                    stats.available_keys,
                    stats.rate_limited_keys,
                    info.model,
                    info.endpoint
                );
            }
            let policy = router.policy();
            println!("fallback: {} (depth {})", policy.provider, policy.depth);
        }
    }

    Ok(())
}
