use std::sync::Arc;

use {
    async_trait::async_trait,
    clap::Parser,
    secrecy::Secret,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    castor_gateway::{config, server},
    castor_ryver::{
        IdentityCache, MessageHandler, MessageKind, NormalizedMessage, OutboundMessage, ReplySink,
        RyverApi, RyverOutbound,
    },
};

#[derive(Parser)]
#[command(name = "castor", about = "Castor: Ryver webhook gateway for bot runtimes")]
struct Cli {
    /// Path to the config file (default: ./castor.toml).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long)]
    port: Option<u16>,

    /// Bot API token (overrides config value).
    #[arg(long, env = "CASTOR_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Webhook signing secret (overrides config value).
    #[arg(long, env = "CASTOR_APP_SECRET", hide_env_values = true)]
    app_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

/// Placeholder host runtime: logs every message, acknowledges slash
/// commands through the deferred response, and answers direct traffic
/// through the dispatch router. A real deployment swaps this for its own
/// [`MessageHandler`].
struct LoggingHandler {
    outbound: RyverOutbound,
}

#[async_trait]
impl MessageHandler for LoggingHandler {
    async fn on_message(&self, message: NormalizedMessage, reply: Option<ReplySink>) {
        info!(
            kind = ?message.kind,
            channel = %message.channel,
            user = message.user_id,
            text = %message.text,
            "message received"
        );
        match (&message.kind, reply) {
            (MessageKind::Command, Some(reply)) => {
                reply.send(OutboundMessage {
                    text: format!("Received: {}", message.text),
                    channel: message.channel.to_string(),
                    ephemeral_user_id: Some(message.user_id),
                });
            },
            (MessageKind::DirectMention | MessageKind::DirectMessage, _) => {
                let ack = OutboundMessage {
                    text: format!("Received: {}", message.text),
                    channel: message.channel.to_string(),
                    ephemeral_user_id: None,
                };
                if let Err(e) = self.outbound.send(&ack).await {
                    tracing::warn!(channel = %ack.channel, "failed to send reply: {e}");
                }
            },
            _ => {},
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut config = config::discover_and_load(cli.config.as_deref());
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(token) = cli.bot_token {
        config.ryver.bot_token = Secret::new(token);
    }
    if let Some(secret) = cli.app_secret {
        config.ryver.app_secret = Some(Secret::new(secret));
    }

    if config.ryver.api_root.is_empty() {
        anyhow::bail!("ryver.api_root is required (set it in castor.toml)");
    }
    if config.ryver.app_secret.is_none() {
        tracing::warn!("no app_secret configured; webhook signatures will not be verified");
    }

    let api = Arc::new(RyverApi::new(
        &config.ryver.api_root,
        config.ryver.bot_token.clone(),
    ));
    let identity = Arc::new(IdentityCache::new());
    identity.initialize(&api).await;

    let state = server::AppState {
        config: Arc::new(config),
        identity,
        handler: Arc::new(LoggingHandler {
            outbound: RyverOutbound::new(api),
        }),
    };
    server::run(state).await
}
