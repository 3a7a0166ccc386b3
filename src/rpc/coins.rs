//! `coins.CoinsService` implementation.

use tonic::{Request, Response, Status};

use crate::rpc::proto::{
    coins_service_server::CoinsService, HelloReply, HelloRequest,
};

/// Fixed reply for `SayHello`.
pub const GREETING: &str = "Hello, World!";

/// Stateless handler for the coins service.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoinsRpc;

#[tonic::async_trait]
impl CoinsService for CoinsRpc {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        tracing::debug!(remote_addr = ?request.remote_addr(), "SayHello");
        Ok(Response::new(HelloReply {
            message: GREETING.to_string(),
        }))
    }
}
