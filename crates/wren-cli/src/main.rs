use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use wren::agent::Agent;
use wren::config::Config;
use wren::memory::Memory;
use wren::providers::configs::{OpenAiProviderConfig, ProviderConfig};
use wren::providers::factory::get_provider;
use wren::tools::default_registry;

mod prompt;
mod session;
mod thinking;

use prompt::RustylinePrompt;
use session::Session;

#[derive(Parser)]
#[command(name = "wren", author, version, about, long_about = None)]
struct Cli {
    /// Model to use (overrides WREN_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// API key (overrides WREN_API_KEY / OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint (overrides WREN_API_BASE)
    #[arg(long)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session name; an existing session with the same name is resumed
    #[arg(short, long)]
    session: Option<String>,

    /// Review every final answer with a reflection pass
    #[arg(long)]
    reflect: bool,

    /// Do not record this session to disk
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    config.validate()?;

    let provider = get_provider(ProviderConfig::OpenAi(OpenAiProviderConfig {
        host: config.host.clone(),
        api_key: config.api_key.clone(),
        model: config.model.clone(),
        temperature: config.temperature,
        top_p: config.top_p,
        max_tokens: config.max_tokens,
    }))?;

    let registry = default_registry()?;
    let agent = Agent::new(provider, registry, &config)?;

    let session_file = if cli.no_save {
        None
    } else {
        Some(session_path(cli.session.as_deref())?)
    };
    let memory = match &session_file {
        Some(path) => Memory::load(path).context("failed to load session file")?,
        None => Memory::new(),
    };

    println!(
        "wren {} {}",
        env!("CARGO_PKG_VERSION"),
        style(format!("- model {}, /help for commands", config.model)).dim()
    );

    let prompt = RustylinePrompt::new()?;
    let mut session = Session::new(agent, memory, prompt, session_file);
    session.start().await
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env();
    if let Some(path) = &cli.config {
        config
            .apply_file(path)
            .with_context(|| format!("failed to apply {}", path.display()))?;
    }

    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = api_key.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.host = base_url.clone();
    }
    if let Some(temperature) = cli.temperature {
        config.temperature = Some(temperature);
    }
    if cli.reflect {
        config.enable_reflection = true;
    }

    Ok(config)
}

/// Where a session is recorded. Unnamed sessions get a generated name so
/// they can still be resumed later with --session.
fn session_path(name: Option<&str>) -> Result<PathBuf> {
    let name = match name {
        Some(name) => name.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };
    let dir = dirs::home_dir()
        .context("could not determine home directory")?
        .join(".wren")
        .join("sessions");
    Ok(dir.join(format!("{name}.jsonl")))
}
