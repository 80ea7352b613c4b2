//! TCP admin server

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::protocol::{encode_response, parse_command, AdminCommand, AdminResponse, ProtocolError};

/// Trait that the host implements to handle admin commands
pub trait AdminHandler: Send + Sync + 'static {
    fn handle_command(&mut self, cmd: AdminCommand) -> AdminResponse;
}

/// Admin server handle - keep this alive to keep the server running
pub struct AdminServer {
    _handle: tokio::task::JoinHandle<()>,
    local_addr: Option<SocketAddr>,
}

impl AdminServer {
    /// Start the admin server on localhost at the given port.
    /// Returns immediately -- binding and serving happen in the background.
    pub fn start(handler: Arc<Mutex<dyn AdminHandler>>, port: u16) -> Self {
        let handle = tokio::spawn(async move {
            let addr = format!("127.0.0.1:{}", port);
            match TcpListener::bind(&addr).await {
                Ok(listener) => {
                    log::info!("Admin server listening on {}", addr);
                    serve(listener, handler).await;
                }
                Err(e) => log::error!("Failed to bind admin server on {}: {}", addr, e),
            }
        });

        Self {
            _handle: handle,
            local_addr: None,
        }
    }

    /// Bind `addr` now and serve in the background. Port 0 picks a free port.
    pub async fn bind(handler: Arc<Mutex<dyn AdminHandler>>, addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        log::info!("Admin server listening on {}", local_addr);
        let handle = tokio::spawn(serve(listener, handler));

        Ok(Self {
            _handle: handle,
            local_addr: Some(local_addr),
        })
    }

    /// Bound address, when known
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

async fn serve(listener: TcpListener, handler: Arc<Mutex<dyn AdminHandler>>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::info!("Admin client connected from {}", peer);
                let handler = handler.clone();
                tokio::spawn(async move {
                    handle_connection(stream, handler).await;
                    log::info!("Admin client disconnected: {}", peer);
                });
            }
            Err(e) => {
                log::error!("Admin server accept error: {}", e);
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    handler: Arc<Mutex<dyn AdminHandler>>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // Connection closed
            Ok(_) => {
                let response = match parse_command(&line) {
                    Ok(cmd) => {
                        log::debug!("Admin command: {:?}", cmd);
                        let mut h = handler.lock().await;
                        h.handle_command(cmd)
                    }
                    Err(ProtocolError::Empty) => continue,
                    Err(e) => AdminResponse::error(e.to_string()),
                };

                let out = encode_response(&response);
                if let Err(e) = writer.write_all(out.as_bytes()).await {
                    log::error!("Admin server write error: {}", e);
                    break;
                }
                if let Err(e) = writer.flush().await {
                    log::error!("Admin server flush error: {}", e);
                    break;
                }
            }
            Err(e) => {
                log::error!("Admin server read error: {}", e);
                break;
            }
        }
    }
}
