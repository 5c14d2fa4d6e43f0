//! HTTP server: accept loop and shared application state.

use crate::api::router::route_request;
use crate::capture::CaptureStore;
use crate::config::Config;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<CaptureStore>,
}

impl AppState {
    /// Build state with a fresh store sized from `config`
    pub fn new(config: Config) -> Self {
        let store = Arc::new(CaptureStore::new(config.store_ttl()));
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Parrot HTTP server
pub struct ParrotServer {
    listener: TcpListener,
    state: AppState,
}

impl ParrotServer {
    /// Bind the listener without serving yet
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    /// Address actually bound, useful when binding port 0
    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process is stopped
    pub async fn run(self) -> Result<(), anyhow::Error> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Also drives the capture store cleanup, which stops with the server.
    /// Connections already accepted are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!("Parrot listening on http://{}", addr);

        let cleanup = self
            .state
            .store
            .spawn_cleanup(self.state.config.store_cleanup_interval());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, client_addr)) => {
                            let io = TokioIo::new(stream);
                            let state = self.state.clone();

                            tokio::spawn(async move {
                                let service = service_fn(move |req| {
                                    let state = state.clone();
                                    async move { route_request(req, state).await }
                                });

                                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                    debug!("Connection error from {}: {}", client_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Parrot on {} shutting down", addr);
                    break;
                }
            }
        }

        cleanup.abort();
        Ok(())
    }
}
