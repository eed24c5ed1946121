//! # roomsync-client
//!
//! Client library for roomsync, the classroom room-state synchronizer.
//!
//! Every participant runs a [`RoomClient`]. Clients talk to each other only
//! through a shared pub/sub channel; there is no authoritative server.
//!
//! ## Features
//!
//! - **Grouped room state**: creator, speaking, hand raising and joiners,
//!   rebuilt by the pure reducer in roomsync-core
//! - **Client-side authority**: commands are checked before sending and
//!   again on receipt
//! - **Channel abstraction**: pluggable [`CommandChannel`] with an
//!   in-process [`MemoryHub`] for tests and simulations
//! - **Chat log** with backward history pagination
//! - **Exclusive screen share** guard
//!
//! ## Example
//!
//! ```ignore
//! use roomsync_client::{MemoryHub, Role, RoomClient, RoomConfig, StaticProfiles};
//!
//! let hub = MemoryHub::new();
//! let profiles = StaticProfiles::new()
//!     .with_user("teacher", "Ms. Frizzle")
//!     .with_user("alice", "Alice");
//!
//! let teacher = RoomClient::new(
//!     RoomConfig::new("teacher", "physics-101", Role::Creator),
//!     hub.channel(),
//!     profiles.clone(),
//! );
//! teacher.join().await?;
//! teacher.toggle_class_mode().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod profile;
pub mod room;
pub mod screen_share;

pub use channel::{
    Attributes, ChannelError, ChannelEvent, CommandChannel, MemoryChannel, MemoryHub,
    CREATOR_ATTRIBUTE,
};
pub use config::{ConfigError, RoomConfig};
pub use error::ClientError;
pub use profile::{ProfileResolver, ResolveError, StaticProfiles};
pub use room::{RoomClient, RoomSnapshot};
pub use screen_share::{MediaError, ScreenPublisher, ScreenShare};

pub use roomsync_core::{Role, SessionPhase};

/// Wall clock milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
