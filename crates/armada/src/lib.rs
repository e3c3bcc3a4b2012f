//! # Armada
//!
//! Authoritative server for two-player naval combat over WebSockets.
//!
//! The server owns all game state: clients connect, register under a
//! display name, invite each other, and play placement-then-combat
//! matches whose every rule is enforced here. Clients are pure views —
//! they render what the server pushes and never resolve a shot
//! themselves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armada::ArmadaServer;
//! use armada_protocol::JsonCodec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), armada::ArmadaError> {
//!     let server = ArmadaServer::<JsonCodec>::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod discovery;
mod error;
mod handler;
mod server;

pub use discovery::DiscoveryResponder;
pub use error::ArmadaError;
pub use server::{ArmadaServer, ArmadaServerBuilder};

pub use armada_match::MatchConfig;
