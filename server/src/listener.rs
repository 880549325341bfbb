use std::error::Error;
use std::sync::Arc;

use log::{error, info};
use tokio::net::{TcpListener, TcpSocket};

use crate::broker::Broker;
use crate::connection::handle_connection;

/// Minimum accept backlog spec §6 requires.
const LISTEN_BACKLOG: u32 = 1024;

/// The listening socket and accept loop (spec §2's "external
/// collaborator"): thin plumbing that hands each new connection to a
/// fresh handler task. Binding and accept failures are the only thing
/// it ever logs itself — every per-connection error is handled inside
/// `handle_connection` and never propagates back here (spec §7).
pub struct Listener {
    tcp_listener: TcpListener,
}

impl Listener {
    /// Binds `addr` with an explicit backlog, since `TcpListener::bind`
    /// alone leaves the backlog at the platform default and spec §6
    /// pins it at ≥ 1000.
    pub async fn bind(addr: String) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let addr: std::net::SocketAddr = addr.parse()?;
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;

        Ok(Self {
            tcp_listener: socket.listen(LISTEN_BACKLOG)?,
        })
    }

    /// Awaits `SIGINT` or, on unix, `SIGTERM` as well — the async
    /// analogue of the source's signal handlers that tear down the
    /// trie and exit (spec §5's shutdown rule). Shutdown is abrupt:
    /// in-flight connections are severed by process exit, no drain is
    /// attempted.
    async fn shutdown_signal() -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut terminate =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
            tokio::select! {
                result = ctrl_c => result,
                _ = terminate.recv() => Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await
        }
    }

    pub async fn listen(self, broker: Arc<Broker>) -> Result<(), Box<dyn Error + Send + Sync>> {
        loop {
            tokio::select! {
                signal = Self::shutdown_signal() => {
                    signal?;
                    info!("received shutdown signal, exiting");
                    return Ok(());
                }

                result = self.tcp_listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("accept failed: {e}");
                            continue;
                        }
                    };

                    let broker = broker.clone();
                    tokio::spawn(async move {
                        info!("accepted connection from {peer}");
                        handle_connection(stream, broker).await;
                    });
                }
            }
        }
    }
}
