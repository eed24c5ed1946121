//! # roomsync-types
//!
//! Wire format types for the roomsync classroom state protocol.
//!
//! This crate provides the foundational types used across all roomsync crates:
//! - [`UserId`], [`RoomId`], [`MediaId`], [`MessageId`] - Identity types
//! - [`User`], [`Profile`] - Participant records
//! - [`Command`], [`CommandFrame`] - Control commands and their wire frame
//! - [`Message`] - Chat log entries
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod error;
mod ids;
mod message;
mod user;

pub use command::{
    ClassMode, Command, CommandFrame, CommandType, DeviceState, SpeakConfig, PROTOCOL_VERSION,
};
pub use error::WireError;
pub use ids::{MediaId, MessageId, RoomId, UserId};
pub use message::{Message, MessageBody, MessageKind};
pub use user::{Profile, User};
