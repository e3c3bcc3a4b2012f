//! The Armada server binary.
//!
//! Configuration comes from the environment:
//! - `ARMADA_BIND` — listen address, default `0.0.0.0:8080`
//! - `ARMADA_DISCOVERY_PORT` — UDP discovery port; unset disables it
//! - `RUST_LOG` — tracing filter, default `armada=info`

use armada::{ArmadaError, ArmadaServer};
use armada_protocol::JsonCodec;

#[tokio::main]
async fn main() -> Result<(), ArmadaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "armada=info".into()),
        )
        .init();

    let bind = std::env::var("ARMADA_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let mut builder = ArmadaServer::<JsonCodec>::builder().bind(&bind);
    if let Some(port) = std::env::var("ARMADA_DISCOVERY_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    {
        builder = builder.discovery_port(port);
    }

    let server = builder.build().await?;
    tracing::info!(addr = %server.local_addr()?, "Armada listening");
    server.run().await
}
