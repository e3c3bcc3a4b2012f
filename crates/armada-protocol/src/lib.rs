//! Wire protocol for Armada.
//!
//! This crate defines the language clients and server speak:
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`],
//!   [`PlayerId`], [`MatchId`], [`PlayerInfo`]) — the structures that
//!   travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the
//! directory/match layers (player context). It doesn't know about
//! connections or matches — it only knows how to describe and serialize
//! messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, Envelope, MatchId, PlayerId, PlayerInfo, ServerMessage};
