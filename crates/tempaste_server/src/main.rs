//! tempaste server entrypoint: HTTP API plus raw TCP ingest.

use tempaste_core::{constants::DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT, DEFAULT_TCP_PORT};
use tempaste_server::{
    config::{env_flag_enabled, Config},
    resolve_bind_address, serve_router, serve_tcp, AppState, TcpSettings,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tempaste=info,tempaste_core=info,tempaste_server=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;
    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let state = AppState::new(config.clone());

    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - listeners may bind to non-loopback addresses");
    }

    let http_bind = resolve_bind_address(
        std::env::var("BIND").ok().as_deref(),
        config.port,
        allow_public,
    );
    let listener = tokio::net::TcpListener::bind(http_bind).await?;
    let http_addr = listener.local_addr().unwrap_or(http_bind);
    tracing::info!("tempaste HTTP running at http://{}", http_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let tcp_task = if config.tcp_enabled {
        let tcp_bind = resolve_bind_address(
            std::env::var("TCP_BIND").ok().as_deref(),
            config.tcp_port,
            allow_public,
        );
        let tcp_listener = tokio::net::TcpListener::bind(tcp_bind).await?;
        tracing::info!(
            "tempaste TCP ingest listening on {}",
            tcp_listener.local_addr().unwrap_or(tcp_bind)
        );
        let settings = TcpSettings {
            base_url: config.tcp_base_url(http_addr),
            read_timeout: config.tcp_read_timeout,
        };
        Some(tokio::spawn(serve_tcp(
            tcp_listener,
            state.ingest.clone(),
            settings,
            wait_for_shutdown(shutdown_rx.clone()),
        )))
    } else {
        tracing::info!("TCP ingest disabled");
        None
    };

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutting down gracefully...");
        let _ = shutdown_tx.send(true);
    });

    let serve_result = serve_router(listener, state, wait_for_shutdown(shutdown_rx)).await;

    if let Some(task) = tcp_task {
        match task.await {
            Ok(Err(err)) => tracing::error!("TCP ingest listener failed: {}", err),
            Err(err) => tracing::error!("TCP ingest task panicked: {}", err),
            Ok(Ok(())) => {}
        }
    }

    serve_result?;
    Ok(())
}

fn print_help() {
    println!("tempaste - ephemeral paste server\n");
    println!("Usage: tempaste [OPTIONS]\n");
    println!("Options:");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  PORT              HTTP port (default: {})", DEFAULT_PORT);
    println!("  TCP_PORT          Raw TCP ingest port (default: {})", DEFAULT_TCP_PORT);
    println!(
        "  MAX_PASTE_SIZE    Maximum paste size in bytes (default: {})",
        DEFAULT_MAX_PASTE_SIZE
    );
    println!("  PUBLIC_URL        Base URL used in returned paste links");
    println!("  TCP_READ_TIMEOUT_SECS  Idle timeout for TCP uploads (default: 30)");
    println!("  DISABLE_TCP       Do not start the TCP ingest listener");
    println!("  ALLOW_PUBLIC_ACCESS  Allow binding to non-loopback addresses");
    println!(
        "  BIND              Override HTTP bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
    println!(
        "  TCP_BIND          Override TCP bind address (e.g. 0.0.0.0:{})",
        DEFAULT_TCP_PORT
    );
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // A dropped sender also means shutdown.
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
