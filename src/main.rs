use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rawhttp::config::ServerConfig;
use rawhttp::handler::Router;
use rawhttp::net::Server;

#[derive(Parser)]
#[command(name = "rawhttp", about = "HTTP/1.1 server over raw TCP")]
struct Cli {
    /// TOML config file. Missing or invalid files fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config file.
    #[arg(long)]
    port: Option<u16>,
}

#[async_std::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rawhttp=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    let router = Router::new(&config);
    let server = Server::bind(config, router).await?;
    server.run().await
}
