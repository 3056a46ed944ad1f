//! TCP Server
//!
//! Accepts connections and dispatches each to its own handler thread.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::engine::EngineHandle;
use crate::error::{Result, StrataError};
use crate::network::Connection;
use crate::protocol::{write_response, Response};

/// TCP server for StrataKV
pub struct Server {
    config: Config,
    engine: EngineHandle,
    shutdown: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and engine handle
    pub fn new(config: Config, engine: EngineHandle) -> Self {
        Self {
            config,
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start the server (blocking).
    ///
    /// Accepts connections until [`shutdown`] is signalled, spawning one
    /// handler thread per client.
    ///
    /// [`shutdown`]: Server::shutdown
    pub fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            StrataError::Network(format!("cannot bind {}: {}", self.config.listen_addr, e))
        })?;

        tracing::info!("Listening on {}", self.config.listen_addr);

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            if self.active_connections.load(Ordering::Relaxed) >= self.config.max_connections {
                tracing::warn!("Connection limit reached, rejecting client");
                let mut stream = stream;
                let _ = write_response(&mut stream, &Response::error("server is at capacity"));
                continue;
            }

            let engine = self.engine.clone();
            let counter = Arc::clone(&self.active_connections);
            let read_ms = self.config.read_timeout_ms;
            let write_ms = self.config.write_timeout_ms;

            counter.fetch_add(1, Ordering::Relaxed);
            let spawned = std::thread::Builder::new()
                .name("stratakv-conn".to_string())
                .spawn(move || {
                    let result = Connection::new(stream, engine).and_then(|mut conn| {
                        conn.set_timeouts(read_ms, write_ms)?;
                        conn.handle()
                    });
                    if let Err(e) = result {
                        tracing::warn!("Connection ended with error: {}", e);
                    }
                    counter.fetch_sub(1, Ordering::Relaxed);
                });

            if let Err(e) = spawned {
                self.active_connections.fetch_sub(1, Ordering::Relaxed);
                tracing::error!("Failed to spawn connection thread: {}", e);
            }
        }

        tracing::info!("Server accept loop stopped");
        Ok(())
    }

    /// Signal the server to stop accepting connections.
    ///
    /// The accept loop notices on the next incoming connection attempt.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Number of currently active client connections
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}
