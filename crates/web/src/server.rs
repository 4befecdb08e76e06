//! Serving a [`Router`] over TCP.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use cornercut_http::connection::HttpConnection;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::Router;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    port: u16,
    address: IpAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 80, address: IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
    }
}

impl ServerConfig {
    /// Port 80 on every interface.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn address(mut self, address: IpAddr) -> Self {
        self.address = address;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("can't bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// A running accept loop.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address actually bound, with the real port when port 0 was asked for.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections. Connections already accepted are served to their end.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Router {
    /// Binds `config`'s address and serves this router on it.
    ///
    /// The returned handle is also stored on the router. Starting a server again
    /// replaces the stored handle and shuts the previous server down.
    pub async fn create_server(self: &Arc<Self>, config: ServerConfig) -> Result<Arc<ServerHandle>, ServerError> {
        let address = config.socket_addr();
        let tcp_listener =
            TcpListener::bind(address).await.map_err(|source| ServerError::Bind { address, source })?;
        let local_addr = tcp_listener.local_addr().map_err(|source| ServerError::Bind { address, source })?;

        info!(address = %local_addr, "start listening");
        let task = tokio::spawn(accept_loop(tcp_listener, Arc::clone(self)));
        let handle = Arc::new(ServerHandle { local_addr, task });

        if let Some(previous) = self.webserver.swap(Some(Arc::clone(&handle))) {
            info!(address = %previous.local_addr(), "replaced by a new server, shutdown");
            previous.shutdown();
        }
        Ok(handle)
    }

    /// The handle of the server most recently started on this router.
    pub fn server(&self) -> Option<Arc<ServerHandle>> {
        self.webserver.load_full()
    }

    /// Shuts down the running server, returning whether there was one.
    pub fn shutdown_server(&self) -> bool {
        match self.webserver.swap(None) {
            Some(handle) => {
                info!(address = %handle.local_addr(), "server shutdown");
                handle.shutdown();
                true
            }
            None => false,
        }
    }
}

async fn accept_loop(tcp_listener: TcpListener, router: Arc<Router>) {
    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            match HttpConnection::new(reader, writer).process(router).await {
                Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => error!(cause = %e, %remote_addr, "connection error, connection shutdown"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Route, handler_fn};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn local() -> ServerConfig {
        ServerConfig::new().address(IpAddr::V4(Ipv4Addr::LOCALHOST)).port(0)
    }

    async fn request(address: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(address).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn wait_finished(handle: &ServerHandle) {
        for _ in 0..100 {
            if handle.is_finished() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("server at {} still running", handle.local_addr());
    }

    #[test]
    fn default_config_binds_port_80_everywhere() {
        assert_eq!(ServerConfig::default().socket_addr(), "0.0.0.0:80".parse().unwrap());
    }

    #[tokio::test]
    async fn serves_router_over_tcp() {
        let router = Arc::new(Router::new());
        router.add(Route::new("/hi").endpoint(handler_fn(|_req, res, _ctx| {
            res.end("hello");
            Ok(())
        })));

        let handle = router.create_server(local()).await.unwrap();
        let address = handle.local_addr();
        assert_ne!(address.port(), 0);

        let response = request(address, "GET /hi HTTP/1.1\r\nConnection: close\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("\r\n\r\nhello"));

        let response = request(address, "GET /bye HTTP/1.0\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with("404\n<br />Not found!"));

        assert!(router.shutdown_server());
        assert!(!router.shutdown_server());
        wait_finished(&handle).await;
    }

    #[tokio::test]
    async fn starting_again_replaces_previous_server() {
        let router = Arc::new(Router::new());

        let first = router.create_server(local()).await.unwrap();
        let second = router.create_server(local()).await.unwrap();

        wait_finished(&first).await;
        assert!(!second.is_finished());
        assert_eq!(router.server().map(|handle| handle.local_addr()), Some(second.local_addr()));

        router.shutdown_server();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let router = Arc::new(Router::new());
        let running = router.create_server(local()).await.unwrap();

        let taken = local().port(running.local_addr().port());
        let err = router.create_server(taken).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { address, .. } if address == running.local_addr()));
        assert!(router.server().is_some());

        router.shutdown_server();
    }
}
