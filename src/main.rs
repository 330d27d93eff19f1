use anyhow::Context;
use chat_relay::config::RelayConfig;
use chat_relay::relay::ChatRelay;
use chat_relay::server::build_router;
use chat_relay::util::{env_bind_addr, init_tracing};
use std::env;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    // Check for --config flag
    let config_arg = args
        .iter()
        .find(|a| a.starts_with("--config="))
        .and_then(|a| a.strip_prefix("--config="))
        .map(|s| s.to_string());

    let base = match config_arg {
        Some(path) => {
            tracing::info!("Loading relay configuration from: {}", path);
            match RelayConfig::load_from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("Failed to load relay config: {:#}", e);
                    tracing::warn!("Continuing with default relay config");
                    RelayConfig::default()
                }
            }
        }
        None => {
            tracing::info!("No relay config provided");
            tracing::info!(
                "Usage: {} [--config=relay.json]",
                args.first().map(String::as_str).unwrap_or("chat-relay")
            );
            RelayConfig::default()
        }
    };
    let config = base.with_env();

    tracing::info!(
        "Provider: {} (model {})",
        config.completions_url(),
        config.model
    );
    if config.api_key().is_none() {
        // Only /api/chat depends on the key; it answers 500 until one is configured.
        tracing::warn!("No provider API key set (CHAT_RELAY_API_KEY or DEEPSEEK_API_KEY)");
    }

    let app = build_router(ChatRelay::new(config));

    let addr = env_bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Chat relay listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
