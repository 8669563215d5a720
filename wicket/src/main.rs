//! wicket: expose a TCP service to a peer behind NAT over a WebRTC data
//! channel, with a minimal HTTP rendezvous for the offer/answer exchange.

use clap::Parser;

#[derive(Parser)]
#[command(name = "wicket")]
#[command(about = "TCP tunneling over a WebRTC data channel")]
struct Args {
    /// HTTP rendezvous address: bound in answer mode, dialed in offer mode
    #[arg(long, default_value = "0.0.0.0:51632")]
    signal: String,

    /// Run the offer (client) role instead of the answer (server) role
    #[arg(long)]
    offer: bool,

    /// Service exposed to the peer (answer mode)
    #[arg(long, default_value = "localhost:22")]
    expose: String,

    /// Local listener forwarded to the peer's exposed service (offer mode)
    #[arg(long, default_value = "0.0.0.0:10000")]
    listen: String,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.offer {
        wicket::client::run(&args.signal, &args.listen).await?;
    } else {
        wicket::server::run(&args.signal, &args.expose).await?;
    }

    Ok(())
}
