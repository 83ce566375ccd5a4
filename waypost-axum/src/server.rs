//! Serving an [AxumRouter] with hyper.

use crate::router::AxumRouter;
use hyper::Error as HyperError;
use std::future::Future;
use std::net::AddrParseError;
use thiserror::Error;
use tracing::info;

/// Errors related to running a server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Error parsing listen address: {0}")]
    ListenAddressParseError(AddrParseError),
    #[error("Error binding server: {0}")]
    BindError(#[source] HyperError),
    #[error("Error running server: {0}")]
    ServeError(#[source] HyperError),
}

impl AxumRouter {
    /// Serves registered routes on given address until `shutdown` completes.
    pub async fn serve<F>(self, listen_address: &str, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let builder = axum::Server::try_bind(
            &listen_address
                .parse()
                .map_err(ServerError::ListenAddressParseError)?,
        )
        .map_err(ServerError::BindError)?;

        info!(
            listen_address,
            routes = self.routes().len(),
            "Starting server"
        );

        builder
            .serve(self.into_router().into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::ServeError)
    }
}
