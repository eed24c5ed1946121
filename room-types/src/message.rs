//! Chat log entries.

use serde::{Deserialize, Serialize};

use crate::{MessageId, UserId};

/// Kind of a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Participant chat text.
    ChannelMessage,
    /// Creator notice.
    Notice,
    /// Chat muted / unmuted marker.
    BanNotice,
}

impl MessageKind {
    /// Whether entries of this kind are shown when loaded from history.
    pub fn is_displayable_history(&self) -> bool {
        matches!(self, MessageKind::ChannelMessage | MessageKind::Notice)
    }
}

/// Content of a chat log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Participant chat text.
    Chat(String),
    /// Creator notice text.
    Notice(String),
    /// Chat muted (`true`) or unmuted (`false`).
    Ban(bool),
}

/// One entry of the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique entry id.
    pub id: MessageId,
    /// Wall clock milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Author of the entry.
    pub sender_id: UserId,
    /// Content.
    pub body: MessageBody,
}

impl Message {
    /// Create an entry with a fresh id.
    pub fn new(body: MessageBody, sender_id: UserId, timestamp: u64) -> Self {
        Self {
            id: MessageId::new(),
            timestamp,
            sender_id,
            body,
        }
    }

    /// Kind of this entry.
    pub fn kind(&self) -> MessageKind {
        match self.body {
            MessageBody::Chat(_) => MessageKind::ChannelMessage,
            MessageBody::Notice(_) => MessageKind::Notice,
            MessageBody::Ban(_) => MessageKind::BanNotice,
        }
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Chat(text) | MessageBody::Notice(text) => Some(text),
            MessageBody::Ban(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_body() {
        let sender = UserId::from("u");
        let chat = Message::new(MessageBody::Chat("hi".into()), sender.clone(), 1);
        let notice = Message::new(MessageBody::Notice("quiet".into()), sender.clone(), 2);
        let ban = Message::new(MessageBody::Ban(true), sender, 3);

        assert_eq!(chat.kind(), MessageKind::ChannelMessage);
        assert_eq!(notice.kind(), MessageKind::Notice);
        assert_eq!(ban.kind(), MessageKind::BanNotice);
        assert_eq!(chat.text(), Some("hi"));
        assert_eq!(ban.text(), None);
    }

    #[test]
    fn ban_notices_are_not_replayed_from_history() {
        assert!(MessageKind::ChannelMessage.is_displayable_history());
        assert!(MessageKind::Notice.is_displayable_history());
        assert!(!MessageKind::BanNotice.is_displayable_history());
    }
}
