//! Channel abstraction for roomsync.
//!
//! A channel is the shared pub/sub session every participant of a room
//! joins. It carries opaque command frames, chat text, membership changes
//! and a small key/value attribute map, and keeps a searchable history of
//! the frames that asked to be retained.
//!
//! # Design
//!
//! The trait is async and session-oriented:
//! - `join()` opens the session for one user in one room
//! - `send_command()` / `send_text()` broadcast to the other members
//! - `recv()` yields the next inbound [`ChannelEvent`]
//! - `leave()` closes the session
//!
//! Delivery is fire-and-forget: there are no acknowledgements, and the
//! sender never receives its own broadcasts back.
//!
//! # Example
//!
//! ```ignore
//! let hub = MemoryHub::new();
//! let channel = hub.channel();
//! channel.join(&user, &room).await?;
//! channel.send_command(&CommandFrame::new(command, false)).await?;
//! while let Some(event) = channel.recv().await? { /* ... */ }
//! ```

mod memory;

pub use memory::{MemoryChannel, MemoryHub};

use std::collections::HashMap;

use async_trait::async_trait;
use roomsync_types::{CommandFrame, Message, RoomId, UserId};
use thiserror::Error;

/// Attribute key naming the room creator.
pub const CREATOR_ATTRIBUTE: &str = "creatorId";

/// Channel attribute map.
pub type Attributes = HashMap<String, String>;

/// Events delivered by a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A decoded command frame from another member.
    Command {
        /// Member that broadcast the frame.
        sender: UserId,
        /// The frame.
        frame: CommandFrame,
    },
    /// Plain chat text from another member.
    Text {
        /// Author.
        sender: UserId,
        /// Message body.
        text: String,
    },
    /// A member joined the channel.
    MemberJoined(UserId),
    /// A member left the channel.
    MemberLeft(UserId),
    /// Channel attributes changed.
    AttributesUpdated(Attributes),
}

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Opening the session failed.
    #[error("join failed: {0}")]
    JoinFailed(String),

    /// Operation needs a joined session.
    #[error("not joined")]
    NotJoined,

    /// Broadcast was rejected.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// History query failed.
    #[error("history query failed: {0}")]
    HistoryFailed(String),

    /// Attribute read or write failed.
    #[error("attribute update failed: {0}")]
    AttributesFailed(String),

    /// Inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Shared pub/sub session for one room.
///
/// Implementations wrap a concrete realtime messaging service. They are
/// responsible for encoding frames on the wire and decoding them on receipt.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Open the session as `user` in `room`.
    async fn join(&self, user: &UserId, room: &RoomId) -> Result<(), ChannelError>;

    /// Broadcast a command frame to the other members.
    ///
    /// Frames with `need_history` set are kept in the channel history.
    async fn send_command(&self, frame: &CommandFrame) -> Result<(), ChannelError>;

    /// Broadcast chat text to the other members. Text is always retained.
    async fn send_text(&self, text: &str) -> Result<(), ChannelError>;

    /// Next inbound event, or `None` when nothing more will arrive.
    async fn recv(&self) -> Result<Option<ChannelEvent>, ChannelError>;

    /// Current members, in join order.
    async fn members(&self) -> Result<Vec<UserId>, ChannelError>;

    /// Retained messages with `from_ms <= timestamp <= to_ms`.
    async fn fetch_history(&self, from_ms: u64, to_ms: u64) -> Result<Vec<Message>, ChannelError>;

    /// Read the attribute map of `room`.
    async fn get_attributes(&self, room: &RoomId) -> Result<Attributes, ChannelError>;

    /// Merge `attributes` into the attribute map of `room`.
    async fn set_attributes(&self, room: &RoomId, attributes: Attributes)
        -> Result<(), ChannelError>;

    /// Close the session.
    async fn leave(&self) -> Result<(), ChannelError>;
}
