//! Unified error type for the Armada server.

use armada_directory::DirectoryError;
use armada_match::MatchError;
use armada_protocol::ProtocolError;
use armada_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ArmadaError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A directory-level error (registration, invitations).
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A match-level error (phase, turn, board rejections).
    #[error(transparent)]
    Match(#[from] MatchError),
}
