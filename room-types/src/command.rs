//! Control commands exchanged over the room channel.
//!
//! Commands are the only way peers propagate state mutations. They are
//! fire-and-forget: the channel may duplicate, drop or reorder them, so every
//! receiver re-checks authority before applying one.

use serde::{Deserialize, Serialize};

use crate::{UserId, WireError};

/// Current frame format version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Teaching mode of the room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassMode {
    /// Only the creator and speakers are on stage.
    #[default]
    Lecture,
    /// Every participant is on stage.
    Interaction,
}

impl ClassMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            ClassMode::Lecture => ClassMode::Interaction,
            ClassMode::Interaction => ClassMode::Lecture,
        }
    }
}

/// One entry of a speak batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakConfig {
    /// Target participant.
    pub user: UserId,
    /// Put on stage (`true`) or take off stage (`false`).
    pub speak: bool,
}

impl SpeakConfig {
    /// Create a speak entry.
    pub fn new(user: impl Into<UserId>, speak: bool) -> Self {
        Self {
            user: user.into(),
            speak,
        }
    }
}

/// Requested camera / mic state of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Participant whose devices change.
    pub user: UserId,
    /// Camera enabled.
    pub camera: bool,
    /// Microphone enabled.
    pub mic: bool,
}

/// Discriminator of a [`Command`], used for dispatch and authority checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// A participant raises or lowers their own hand.
    RaiseHand,
    /// The creator answers a raised hand.
    AcceptRaiseHand,
    /// Put participants on or off stage.
    Speak,
    /// Camera / mic change.
    DeviceState,
    /// The creator lowers every raised hand.
    CancelAllHandRaising,
    /// The creator mutes or unmutes the chat.
    BanText,
    /// The creator switches the class mode.
    ClassMode,
    /// Free-text chat.
    ChannelMessage,
    /// Creator notice shown in the chat.
    Notice,
    /// Creator notice retained in channel history.
    HistoryNotice,
}

impl CommandType {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::RaiseHand => "raise-hand",
            CommandType::AcceptRaiseHand => "accept-raise-hand",
            CommandType::Speak => "speak",
            CommandType::DeviceState => "device-state",
            CommandType::CancelAllHandRaising => "cancel-all-hand-raising",
            CommandType::BanText => "ban-text",
            CommandType::ClassMode => "class-mode",
            CommandType::ChannelMessage => "channel-message",
            CommandType::Notice => "notice",
            CommandType::HistoryNotice => "history-notice",
        }
    }

    /// Whether only the room creator may issue this command.
    pub fn is_creator_only(&self) -> bool {
        matches!(
            self,
            CommandType::AcceptRaiseHand
                | CommandType::CancelAllHandRaising
                | CommandType::BanText
                | CommandType::ClassMode
                | CommandType::Notice
                | CommandType::HistoryNotice
        )
    }
}

/// All mutation intents carried by the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Command {
    /// Raise (`true`) or lower (`false`) the sender's hand.
    RaiseHand(bool),
    /// Answer a raised hand.
    AcceptRaiseHand {
        /// Participant whose hand was raised.
        user: UserId,
        /// Put the participant on stage.
        accept: bool,
    },
    /// Batch stage change.
    Speak(Vec<SpeakConfig>),
    /// Device change for one participant.
    DeviceState(DeviceState),
    /// Lower every raised hand.
    CancelAllHandRaising,
    /// Mute (`true`) or unmute (`false`) the chat for non-creators.
    BanText(bool),
    /// Switch the class mode.
    ClassMode(ClassMode),
    /// Chat text.
    ChannelMessage(String),
    /// Creator notice.
    Notice(String),
    /// Creator notice that is also kept in channel history.
    HistoryNotice(String),
}

impl Command {
    /// The discriminator of this command.
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::RaiseHand(_) => CommandType::RaiseHand,
            Command::AcceptRaiseHand { .. } => CommandType::AcceptRaiseHand,
            Command::Speak(_) => CommandType::Speak,
            Command::DeviceState(_) => CommandType::DeviceState,
            Command::CancelAllHandRaising => CommandType::CancelAllHandRaising,
            Command::BanText(_) => CommandType::BanText,
            Command::ClassMode(_) => CommandType::ClassMode,
            Command::ChannelMessage(_) => CommandType::ChannelMessage,
            Command::Notice(_) => CommandType::Notice,
            Command::HistoryNotice(_) => CommandType::HistoryNotice,
        }
    }
}

/// The wire frame: a versioned command plus its history flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFrame {
    /// Frame format version.
    pub version: u8,
    /// The command.
    pub command: Command,
    /// Ask the channel to keep this command in its history.
    pub need_history: bool,
}

impl CommandFrame {
    /// Wrap a command in a current-version frame.
    pub fn new(command: Command, need_history: bool) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            command,
            need_history,
        }
    }

    /// Serialize to MessagePack bytes (field names included).
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Frames from a newer protocol version are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let frame: Self = rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)?;
        if frame.version > PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion(frame.version));
        }
        Ok(frame)
    }
}
