use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Local stand-in for the traffic-violation API.
#[derive(Debug, Parser)]
#[command(name = "mock-server", version)]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5002)]
    port: u16,

    /// Start without the seeded officer, admin and citizen.
    #[arg(long)]
    empty: bool,

    /// Answer officer activity with placeholder figures.
    #[arg(long)]
    mock_activity: bool,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let state = if cli.empty {
        mock_server::AppState::new()
    } else {
        mock_server::AppState::seeded()
    };
    state.set_mock_activity(cli.mock_activity).await;

    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run_with_state(listener, state).await
}
