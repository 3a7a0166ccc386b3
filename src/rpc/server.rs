//! gRPC listener.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::server::NamedService;
use tonic::transport::Server;

use crate::rpc::coins::CoinsRpc;
use crate::rpc::proto::coins_service_server::CoinsServiceServer;

/// Fully qualified name of the served service.
pub const SERVICE_NAME: &str = <CoinsServiceServer<CoinsRpc> as NamedService>::NAME;

/// gRPC server hosting the coins service.
#[derive(Debug, Default)]
pub struct RpcServer {
    coins: CoinsRpc,
}

impl RpcServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve on the given listener until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), tonic::transport::Error> {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        tracing::info!(
            address = ?addr,
            service = SERVICE_NAME,
            "RPC server starting"
        );

        Server::builder()
            .add_service(CoinsServiceServer::new(self.coins))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("RPC server stopped");
        Ok(())
    }
}
