mod app;
mod handlers;
mod state;

use anyhow::Result;
use clap::Parser;
use gatehouse_auth::{AuthConfig, AuthState};
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app::create_app, state::AppState};

/// Gatehouse - Sign in with Google, land on your dashboard
#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gatehouse=debug,gatehouse_auth=debug,gatehouse_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = auth_config(&cli).await?;
    tracing::info!(
        supabase_url = %config.supabase_url,
        app_origin = %config.app_origin,
        "Auth configured"
    );

    let state = AppState::new(AuthState::new(config)?);

    // Build the application router
    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Supabase settings from the environment.
#[cfg(not(feature = "auth-mock"))]
async fn auth_config(_cli: &Cli) -> Result<AuthConfig> {
    Ok(AuthConfig::from_env()?)
}

/// Start the mock GoTrue server and point the app at it.
#[cfg(feature = "auth-mock")]
async fn auth_config(cli: &Cli) -> Result<AuthConfig> {
    use gatehouse_auth::mock_gotrue::MockGoTrueServer;
    use url::Url;

    let port = std::env::var("MOCK_GOTRUE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(54321);

    let server = MockGoTrueServer::new(port);
    let addr = server.spawn().await?;
    tracing::warn!("Using mock GoTrue server on http://{addr} (DEV ONLY)");

    let supabase_url = Url::parse(&format!("http://{addr}"))?;
    let app_origin = std::env::var("APP_ORIGIN")
        .unwrap_or_else(|_| format!("http://localhost:{}", cli.port));
    let app_origin = Url::parse(&app_origin)?;

    Ok(AuthConfig::new(supabase_url, "mock-anon-key", app_origin).with_cookie_secure(false))
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
