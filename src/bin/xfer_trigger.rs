//! Replication trigger utility: tells a secondary to pull a zone from its
//! primary and reports the secondary's verdict.

use bastion_dns::gatekeeper::trigger_zone_transfer;
use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bastion-xfer", about = "Trigger a zone transfer on a secondary server")]
struct Args {
    /// Secondary server to trigger
    #[arg(long, default_value = "127.0.0.1:31112")]
    secondary: SocketAddr,

    /// Zone to transfer
    #[arg(long, default_value = "example.com")]
    zone_name: String,

    /// Primary server the secondary should pull from
    #[arg(long, default_value = "127.0.0.1:31111")]
    primary: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match trigger_zone_transfer(args.secondary, &args.zone_name, args.primary).await {
        Ok(true) => {
            println!("SUCCESS");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("FAILURE");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("zone transfer trigger failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
