use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument};

use crate::commands::executable::Executable;
use crate::commands::{Command, CommandParserError};
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Binds on localhost and serves until the task is dropped. Convenience
/// entry point for embedders that do not need shutdown control.
pub async fn run(port: u16) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let server = Server::bind(("127.0.0.1", port)).await?;
    server.serve().await
}

/// Listener/supervisor: accepts connections, spawns one handler task per
/// client and tracks them for draining at shutdown.
pub struct Server {
    listener: TcpListener,
    store: Store,
    shutdown: CancellationToken,
    handlers: TaskTracker,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Server, Error> {
        let listener = TcpListener::bind(addr).await?;

        Ok(Server {
            listener,
            store: Store::new(),
            shutdown: CancellationToken::new(),
            handlers: TaskTracker::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Token that stops the server when cancelled. Cancellation is
    /// idempotent; after `serve` returns a new server may be bound on the
    /// same address.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accepts connections until the shutdown token fires, then closes the
    /// listener and waits for in-flight handlers to finish.
    pub async fn serve(self) -> Result<(), Error> {
        info!("Server listening on {}", self.listener.local_addr()?);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((socket, client_address)) => {
                            info!("Accepted connection from {:?}", client_address);
                            let store = self.store.clone();
                            self.handlers.spawn(async move {
                                if let Err(e) =
                                    handle_connection(socket, client_address, store).await
                                {
                                    error!("connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
            }
        }

        // Dropping the listener closes the socket, so no new connections get
        // in while the remaining handlers drain.
        drop(self.listener);
        self.handlers.close();
        self.handlers.wait().await;

        info!("Server stopped");
        Ok(())
    }
}

#[instrument(
    name = "connection",
    skip(stream, store),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, client_address);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(frame) = conn.read_frame().await? {
        info!("Received frame from client: {:?}", frame);

        let response = match Command::try_from(frame) {
            Ok(cmd) => match cmd.exec(store.clone()) {
                Ok(frame) => frame,
                Err(err) => Frame::Error(format!("ERR {}", err)),
            },
            Err(err) => {
                // A request that is not an array of strings desynchronizes
                // the stream; the connection cannot be salvaged.
                if let Some(CommandParserError::InvalidRequestFrame { .. }) =
                    err.downcast_ref::<CommandParserError>()
                {
                    return Err(err);
                }
                Frame::Error(format!("ERR {}", err))
            }
        };

        info!("Sending response to client: {:?}", response);
        conn.write_frame(&response).await?;
    }

    info!("Connection closed");
    Ok(())
}
