//! # roomsync-core
//!
//! Pure logic for roomsync (no I/O, instant tests).
//!
//! This crate implements the grouping reducer, the authority rules, the chat
//! log and the session lifecycle without any network access, so all of it
//! is testable with plain `#[test]` functions.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The actual I/O (channel, profile lookups) is
//! performed by `roomsync-client`, which owns one [`RoomState`] and
//! [`MessageLog`] per session and feeds them through these functions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod history;
pub mod reducer;
pub mod session;

pub use authority::{accept, effective_devices, filter_speak, is_creator, Role};
pub use history::{HistoryWindow, MessageLog, DEFAULT_HISTORY_WINDOW_MS};
pub use reducer::{ChangedGroups, Group, Reduction, RoomState};
pub use session::{SessionAction, SessionEvent, SessionPhase};
