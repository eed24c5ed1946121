//! In-process channel for tests and simulations.
//!
//! A [`MemoryHub`] plays the messaging service for a single room. Every
//! [`MemoryChannel`] created from it is one participant's session. Frames
//! travel through the hub as encoded bytes, so the wire codec is exercised
//! exactly as it would be over a network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roomsync_types::{Command, CommandFrame, Message, MessageBody, RoomId, UserId, WireError};

use super::{Attributes, ChannelError, ChannelEvent, CommandChannel};
use crate::now_ms;

/// Shared in-memory room.
#[derive(Debug, Default, Clone)]
pub struct MemoryHub {
    inner: Arc<Mutex<HubInner>>,
}

#[derive(Debug, Default)]
struct HubInner {
    room: Option<RoomId>,
    members: Vec<UserId>,
    inboxes: HashMap<UserId, VecDeque<Delivery>>,
    attributes: Attributes,
    history: Vec<Message>,
}

/// Queued inbound item. Frames stay encoded until the receiver pulls them.
#[derive(Debug)]
enum Delivery {
    Frame { sender: UserId, bytes: Vec<u8> },
    Event(ChannelEvent),
}

impl HubInner {
    /// Queue `delivery` for every member except `sender`.
    fn fan_out(&mut self, sender: &UserId, delivery: impl Fn() -> Delivery) {
        for member in &self.members {
            if member == sender {
                continue;
            }
            if let Some(inbox) = self.inboxes.get_mut(member) {
                inbox.push_back(delivery());
            }
        }
    }

    fn retain(&mut self, sender: &UserId, command: &Command) {
        let body = match command {
            Command::ChannelMessage(text) => MessageBody::Chat(text.clone()),
            Command::Notice(text) | Command::HistoryNotice(text) => {
                MessageBody::Notice(text.clone())
            }
            Command::BanText(banned) => MessageBody::Ban(*banned),
            _ => return,
        };
        self.history
            .push(Message::new(body, sender.clone(), now_ms()));
    }
}

impl MemoryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new participant session on this hub.
    pub fn channel(&self) -> MemoryChannel {
        MemoryChannel {
            hub: self.clone(),
            inner: Arc::default(),
        }
    }

    /// Broadcast `frame` as if `sender` had sent it.
    ///
    /// `sender` does not need to be a member, which lets tests forge traffic
    /// from misbehaving peers.
    pub fn broadcast_as(&self, sender: &UserId, frame: &CommandFrame) -> Result<(), WireError> {
        let bytes = frame.to_bytes()?;
        let mut hub = self.inner.lock().unwrap();
        if frame.need_history {
            hub.retain(sender, &frame.command);
        }
        hub.fan_out(sender, || Delivery::Frame {
            sender: sender.clone(),
            bytes: bytes.clone(),
        });
        Ok(())
    }

    /// Deliver raw bytes as a frame from `sender` to every member.
    pub fn broadcast_raw(&self, sender: &UserId, bytes: Vec<u8>) {
        let mut hub = self.inner.lock().unwrap();
        hub.fan_out(sender, || Delivery::Frame {
            sender: sender.clone(),
            bytes: bytes.clone(),
        });
    }

    /// Add messages to the retained history.
    pub fn seed_history(&self, messages: impl IntoIterator<Item = Message>) {
        let mut hub = self.inner.lock().unwrap();
        hub.history.extend(messages);
    }

    /// Current members, in join order.
    pub fn members(&self) -> Vec<UserId> {
        self.inner.lock().unwrap().members.clone()
    }

    /// Current attribute map.
    pub fn attributes(&self) -> Attributes {
        self.inner.lock().unwrap().attributes.clone()
    }

    /// Everything retained so far.
    pub fn history(&self) -> Vec<Message> {
        self.inner.lock().unwrap().history.clone()
    }
}

/// One participant's session on a [`MemoryHub`].
///
/// Records what it sent and supports forced failures, in the same way as
/// the other test doubles in this crate.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    hub: MemoryHub,
    inner: Arc<Mutex<ChannelInner>>,
}

#[derive(Debug, Default)]
struct ChannelInner {
    user: Option<UserId>,
    left: bool,
    sent_commands: Vec<CommandFrame>,
    sent_texts: Vec<String>,
    fail_next_join: Option<String>,
    fail_next_send: Option<String>,
    fail_next_history: Option<String>,
}

impl ChannelInner {
    fn joined_user(&self) -> Result<UserId, ChannelError> {
        self.user.clone().ok_or(ChannelError::NotJoined)
    }
}

impl MemoryChannel {
    /// Frames this session broadcast.
    pub fn sent_commands(&self) -> Vec<CommandFrame> {
        self.inner.lock().unwrap().sent_commands.clone()
    }

    /// Chat text this session broadcast.
    pub fn sent_texts(&self) -> Vec<String> {
        self.inner.lock().unwrap().sent_texts.clone()
    }

    /// Number of broadcasts of any kind.
    pub fn send_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.sent_commands.len() + inner.sent_texts.len()
    }

    /// Cause the next join() to fail with the given error.
    pub fn fail_next_join(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_join = Some(error.to_string());
    }

    /// Cause the next send_command() or send_text() to fail.
    pub fn fail_next_send(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_send = Some(error.to_string());
    }

    /// Cause the next fetch_history() to fail.
    pub fn fail_next_history(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_history = Some(error.to_string());
    }
}

#[async_trait]
impl CommandChannel for MemoryChannel {
    async fn join(&self, user: &UserId, room: &RoomId) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_join.take() {
            return Err(ChannelError::JoinFailed(error));
        }

        let mut hub = self.hub.inner.lock().unwrap();
        let served = hub.room.get_or_insert_with(|| room.clone());
        if served != room {
            return Err(ChannelError::JoinFailed(format!(
                "hub serves room {served}, not {room}"
            )));
        }

        if !hub.members.contains(user) {
            hub.members.push(user.clone());
            hub.inboxes.insert(user.clone(), VecDeque::new());
            hub.fan_out(user, || {
                Delivery::Event(ChannelEvent::MemberJoined(user.clone()))
            });
        }

        inner.user = Some(user.clone());
        inner.left = false;
        Ok(())
    }

    async fn send_command(&self, frame: &CommandFrame) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        let sender = inner.joined_user()?;

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(ChannelError::SendFailed(error));
        }

        let bytes = frame
            .to_bytes()
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        let mut hub = self.hub.inner.lock().unwrap();
        if frame.need_history {
            hub.retain(&sender, &frame.command);
        }
        hub.fan_out(&sender, || Delivery::Frame {
            sender: sender.clone(),
            bytes: bytes.clone(),
        });

        inner.sent_commands.push(frame.clone());
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        let sender = inner.joined_user()?;

        if let Some(error) = inner.fail_next_send.take() {
            return Err(ChannelError::SendFailed(error));
        }

        let mut hub = self.hub.inner.lock().unwrap();
        hub.retain(&sender, &Command::ChannelMessage(text.to_string()));
        hub.fan_out(&sender, || {
            Delivery::Event(ChannelEvent::Text {
                sender: sender.clone(),
                text: text.to_string(),
            })
        });

        inner.sent_texts.push(text.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<ChannelEvent>, ChannelError> {
        let inner = self.inner.lock().unwrap();
        if inner.left {
            return Ok(None);
        }
        let user = inner.joined_user()?;

        let mut hub = self.hub.inner.lock().unwrap();
        let next = hub
            .inboxes
            .get_mut(&user)
            .and_then(|inbox| inbox.pop_front());

        match next {
            None => Ok(None),
            Some(Delivery::Event(event)) => Ok(Some(event)),
            Some(Delivery::Frame { sender, bytes }) => {
                let frame = CommandFrame::from_bytes(&bytes)
                    .map_err(|e| ChannelError::Malformed(e.to_string()))?;
                Ok(Some(ChannelEvent::Command { sender, frame }))
            }
        }
    }

    async fn members(&self) -> Result<Vec<UserId>, ChannelError> {
        self.inner.lock().unwrap().joined_user()?;
        Ok(self.hub.members())
    }

    async fn fetch_history(&self, from_ms: u64, to_ms: u64) -> Result<Vec<Message>, ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        inner.joined_user()?;

        if let Some(error) = inner.fail_next_history.take() {
            return Err(ChannelError::HistoryFailed(error));
        }

        let hub = self.hub.inner.lock().unwrap();
        Ok(hub
            .history
            .iter()
            .filter(|m| m.timestamp >= from_ms && m.timestamp <= to_ms)
            .cloned()
            .collect())
    }

    async fn get_attributes(&self, room: &RoomId) -> Result<Attributes, ChannelError> {
        let hub = self.hub.inner.lock().unwrap();
        if hub.room.as_ref() != Some(room) {
            return Ok(Attributes::new());
        }
        Ok(hub.attributes.clone())
    }

    async fn set_attributes(
        &self,
        room: &RoomId,
        attributes: Attributes,
    ) -> Result<(), ChannelError> {
        let inner = self.inner.lock().unwrap();
        let sender = inner.joined_user()?;

        let mut hub = self.hub.inner.lock().unwrap();
        if hub.room.as_ref() != Some(room) {
            return Err(ChannelError::AttributesFailed(format!("unknown room {room}")));
        }
        hub.attributes.extend(attributes);
        let snapshot = hub.attributes.clone();
        hub.fan_out(&sender, || {
            Delivery::Event(ChannelEvent::AttributesUpdated(snapshot.clone()))
        });
        Ok(())
    }

    async fn leave(&self) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(user) = inner.user.take() else {
            return Ok(());
        };
        inner.left = true;

        let mut hub = self.hub.inner.lock().unwrap();
        hub.members.retain(|member| member != &user);
        hub.inboxes.remove(&user);
        hub.fan_out(&user, || Delivery::Event(ChannelEvent::MemberLeft(user.clone())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_types::ClassMode;

    fn id(s: &str) -> UserId {
        UserId::from(s)
    }

    fn room() -> RoomId {
        RoomId::from("physics-101")
    }

    async fn joined(hub: &MemoryHub, user: &str) -> MemoryChannel {
        let channel = hub.channel();
        channel.join(&id(user), &room()).await.unwrap();
        channel
    }

    async fn drain(channel: &MemoryChannel) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while let Some(event) = channel.recv().await.unwrap() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn join_announces_member_to_others() {
        let hub = MemoryHub::new();
        let teacher = joined(&hub, "teacher").await;
        let _student = joined(&hub, "alice").await;

        assert_eq!(hub.members(), vec![id("teacher"), id("alice")]);
        assert_eq!(
            drain(&teacher).await,
            vec![ChannelEvent::MemberJoined(id("alice"))]
        );
    }

    #[tokio::test]
    async fn commands_reach_everyone_but_the_sender() {
        let hub = MemoryHub::new();
        let teacher = joined(&hub, "teacher").await;
        let alice = joined(&hub, "alice").await;
        let bob = joined(&hub, "bob").await;
        drain(&teacher).await;
        drain(&alice).await;

        let frame = CommandFrame::new(Command::ClassMode(ClassMode::Interaction), false);
        teacher.send_command(&frame).await.unwrap();

        assert!(drain(&teacher).await.is_empty());
        let expected = vec![ChannelEvent::Command {
            sender: id("teacher"),
            frame: frame.clone(),
        }];
        assert_eq!(drain(&alice).await, expected);
        assert_eq!(drain(&bob).await, expected);
        assert_eq!(teacher.sent_commands(), vec![frame]);
    }

    #[tokio::test]
    async fn only_history_frames_are_retained() {
        let hub = MemoryHub::new();
        let teacher = joined(&hub, "teacher").await;

        teacher
            .send_command(&CommandFrame::new(Command::Notice("quiz".into()), false))
            .await
            .unwrap();
        teacher
            .send_command(&CommandFrame::new(Command::HistoryNotice("homework".into()), true))
            .await
            .unwrap();
        teacher.send_text("hello").await.unwrap();

        let retained: Vec<_> = hub.history().iter().map(|m| m.body.clone()).collect();
        assert_eq!(
            retained,
            vec![
                MessageBody::Notice("homework".into()),
                MessageBody::Chat("hello".into())
            ]
        );

        let all = teacher.fetch_history(0, u64::MAX).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(teacher.fetch_history(0, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forced_failures_fire_once() {
        let hub = MemoryHub::new();
        let channel = hub.channel();

        channel.fail_next_join("service down");
        assert!(matches!(
            channel.join(&id("a"), &room()).await,
            Err(ChannelError::JoinFailed(_))
        ));
        channel.join(&id("a"), &room()).await.unwrap();

        channel.fail_next_send("rate limited");
        assert!(channel.send_text("x").await.is_err());
        channel.send_text("x").await.unwrap();

        channel.fail_next_history("timeout");
        assert!(channel.fetch_history(0, 10).await.is_err());
        assert_eq!(channel.send_count(), 1);
    }

    #[tokio::test]
    async fn operations_need_a_session() {
        let hub = MemoryHub::new();
        let channel = hub.channel();
        assert!(matches!(channel.recv().await, Err(ChannelError::NotJoined)));
        assert!(matches!(
            channel.send_text("x").await,
            Err(ChannelError::NotJoined)
        ));
    }

    #[tokio::test]
    async fn leave_announces_and_closes() {
        let hub = MemoryHub::new();
        let teacher = joined(&hub, "teacher").await;
        let alice = joined(&hub, "alice").await;
        drain(&teacher).await;

        alice.leave().await.unwrap();

        assert_eq!(hub.members(), vec![id("teacher")]);
        assert_eq!(
            drain(&teacher).await,
            vec![ChannelEvent::MemberLeft(id("alice"))]
        );
        assert_eq!(alice.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn attributes_merge_and_broadcast() {
        let hub = MemoryHub::new();
        let teacher = joined(&hub, "teacher").await;
        let alice = joined(&hub, "alice").await;

        let mut attributes = Attributes::new();
        attributes.insert(crate::channel::CREATOR_ATTRIBUTE.into(), "teacher".into());
        teacher.set_attributes(&room(), attributes.clone()).await.unwrap();

        assert_eq!(alice.get_attributes(&room()).await.unwrap(), attributes);
        assert_eq!(
            drain(&alice).await,
            vec![ChannelEvent::AttributesUpdated(attributes)]
        );
    }

    #[tokio::test]
    async fn garbage_bytes_surface_as_malformed() {
        let hub = MemoryHub::new();
        let alice = joined(&hub, "alice").await;

        hub.broadcast_raw(&id("mallory"), vec![0xc1, 0x00]);

        assert!(matches!(alice.recv().await, Err(ChannelError::Malformed(_))));
    }
}
