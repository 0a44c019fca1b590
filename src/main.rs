use chatjimmy_shim::adapters::{EdgeAdapter, FunctionEvent, FunctionEventAdapter, HostAdapter};
use chatjimmy_shim::config::env_lookup;
use chatjimmy_shim::{build_router, route, AppState, FileConfig, ShimConfig};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "chatjimmy-shim",
    about = "OpenAI Chat Completions shim in front of the ChatJimmy chat API",
    version
)]
struct Cli {
    /// Path to config file (TOML). Environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve HTTP locally (default)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Route every request as if it hit this path
        #[arg(long)]
        forced_path: Option<String>,
    },
    /// Handle one function-platform event (JSON) and print the reply
    Invoke {
        /// Event file; reads stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatjimmy_shim=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file_config = FileConfig::find_and_load(cli.config.as_deref())?;
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        forced_path: None,
    }) {
        Command::Serve { port, forced_path } => {
            serve(file_config, client, port, forced_path).await
        }
        Command::Invoke { event } => invoke(file_config, client, event).await,
    }
}

async fn serve(
    file_config: FileConfig,
    client: reqwest::Client,
    port: Option<u16>,
    forced_path: Option<String>,
) -> anyhow::Result<()> {
    let port = port.unwrap_or(file_config.port);
    let adapter = forced_path
        .clone()
        .map(EdgeAdapter::with_forced_path)
        .unwrap_or_default();

    let state = Arc::new(AppState::new(file_config, client).with_adapter(adapter));
    let startup = state.request_config();

    info!("chatjimmy-shim v{}", env!("CARGO_PKG_VERSION"));
    info!("  Upstream:  {}", startup.upstream_url);
    info!("  Model:     {}", startup.default_model);
    info!("  Auth:      {}", if startup.auth_enabled() { "bearer token" } else { "open" });
    info!("  Origin:    {}", startup.allowed_origin);
    if let Some(ref path) = forced_path {
        info!("  Forced:    {}", path);
    }

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);
    info!("  OPENAI_BASE_URL=http://localhost:{}/v1", port);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn invoke(
    file_config: FileConfig,
    client: reqwest::Client,
    event_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let raw = match event_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let event = FunctionEvent::from_json(&raw)?;
    let adapter = FunctionEventAdapter::default();
    let config = ShimConfig::resolve(&file_config, env_lookup);

    let request = adapter.to_core_request(event)?;
    let response = route(request, &config, &client).await;
    let reply = adapter.from_core_response(response);

    println!("{}", serde_json::to_string(&reply)?);
    Ok(())
}
