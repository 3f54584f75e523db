use clap::Parser;
use tracing::{error, info};

use zedis::server::Server;
use zedis::Error;

const PORT: u16 = 6379;

#[derive(Parser, Debug)]
struct Args {
    /// The port to listen on
    #[arg(short, long, default_value_t = PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().init();

    let args = Args::parse();

    let server = Server::bind(("127.0.0.1", args.port)).await?;
    let shutdown = server.shutdown_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received, stopping server");
        shutdown.cancel();
    });

    server.serve().await
}
