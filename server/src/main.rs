use clap::Parser;
use log::{error, info};

use server::{Broker, Listener};

/// `chat_server [port]` — a minimal multi-room TCP chat broker (spec §6).
/// A second positional argument is rejected by clap's own usage message;
/// this process never needs to check the argument count itself.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(default_value_t = protocol::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let addr = format!("0.0.0.0:{}", args.port);

    let listener = match Listener::bind(addr.clone()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("chat_server listening on {addr}");

    let broker = std::sync::Arc::new(Broker::new());

    match listener.listen(broker).await {
        Ok(()) => std::process::exit(130), // terminated by signal, per spec §6
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
