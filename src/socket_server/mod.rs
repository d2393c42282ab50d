pub mod config;

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use std::{path::Path, sync::Arc};
use tokio::{
    net::{UnixListener, UnixStream},
    sync::{broadcast, Semaphore},
    task::JoinHandle,
};
use tokio_util::codec::{AnyDelimiterCodec, Framed};
use tracing::{debug, error, info, warn};

use crate::protocol::CommandHandler;
use config::SocketServerConfig;

/// End-of-text byte closing every reply frame.
pub const REPLY_TERMINATOR: u8 = 0x03;

/// Unix-socket transport standing in for the controller's serial link.
///
/// Requests are newline-terminated command batches. Replies can span
/// several lines (`?RA`), so each one is closed by [`REPLY_TERMINATOR`]
/// instead of a newline: a client reads up to that byte to get exactly
/// one reply per request.
pub struct SocketServer {
    config: SocketServerConfig,
    handler: Arc<dyn CommandHandler>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    accept_task: Option<JoinHandle<()>>,
}

impl SocketServer {
    pub fn new(config: SocketServerConfig, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            config,
            handler,
            shutdown_tx: None,
            accept_task: None,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        if Path::new(&self.config.socket_path).exists() {
            tokio::fs::remove_file(&self.config.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.config.socket_path)?;
        info!("Socket server listening on: {}", self.config.socket_path);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        self.shutdown_tx = Some(shutdown_tx);

        let slots = Arc::new(Semaphore::new(self.config.max_connections));
        self.accept_task = Some(tokio::spawn(accept_clients(
            listener,
            self.handler.clone(),
            slots,
            self.config.buffer_size,
            shutdown_rx,
        )));

        Ok(())
    }

    /// Stops accepting, closes open sessions and removes the socket file.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(accept_task) = self.accept_task.take() {
            if let Err(e) = accept_task.await {
                warn!("Accept loop ended abnormally: {}", e);
            }
        }

        if Path::new(&self.config.socket_path).exists() {
            tokio::fs::remove_file(&self.config.socket_path).await?;
        }

        info!("Socket server shutdown complete");
        Ok(())
    }
}

async fn accept_clients(
    listener: UnixListener,
    handler: Arc<dyn CommandHandler>,
    slots: Arc<Semaphore>,
    max_request_length: usize,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        let stream = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = shutdown_rx.recv() => {
                info!("Socket server shutting down");
                break;
            }
        };

        // A client over the cap is dropped right away and sees EOF.
        let Ok(permit) = slots.clone().try_acquire_owned() else {
            warn!("Connection limit reached, rejecting client");
            continue;
        };
        debug!("Client connected, {} slots left", slots.available_permits());

        let handler = handler.clone();
        let session_shutdown = shutdown_rx.resubscribe();
        tokio::spawn(async move {
            let result = serve_client(stream, handler, max_request_length, session_shutdown).await;
            if let Err(e) = result {
                error!("Client session error: {}", e);
            }
            drop(permit);
            debug!("Client disconnected");
        });
    }
}

async fn serve_client(
    stream: UnixStream,
    handler: Arc<dyn CommandHandler>,
    max_request_length: usize,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let codec = AnyDelimiterCodec::new_with_max_length(
        vec![b'\n'],
        vec![REPLY_TERMINATOR],
        max_request_length,
    );
    let mut framed = Framed::new(stream, codec);

    loop {
        let request = tokio::select! {
            frame = framed.next() => match frame {
                Some(frame) => frame?,
                None => return Ok(()),
            },
            _ = shutdown_rx.recv() => {
                debug!("Shutdown signal received, closing client connection");
                return Ok(());
            }
        };

        let line = String::from_utf8_lossy(&request);
        let reply = handler.handle(line.trim_end_matches('\r')).await;
        framed.send(reply).await?;
    }
}
