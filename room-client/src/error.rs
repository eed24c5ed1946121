//! Client error types.

use thiserror::Error;

use crate::channel::ChannelError;
use crate::profile::ResolveError;
use crate::screen_share::MediaError;

/// Errors surfaced by [`RoomClient`](crate::RoomClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Opening the room session failed.
    #[error("connect failed: {0}")]
    Connect(#[source] ChannelError),

    /// A broadcast was rejected by the channel.
    #[error("send failed: {0}")]
    Send(#[source] ChannelError),

    /// Receiving from the channel failed.
    #[error("receive failed: {0}")]
    Receive(#[source] ChannelError),

    /// Profile lookup failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Operation needs a joined room.
    #[error("not joined")]
    NotJoined,

    /// An exclusive resource is held by someone else.
    #[error("already active: {0}")]
    AlreadyActive(String),

    /// Media publishing failed.
    #[error(transparent)]
    Media(#[from] MediaError),
}
