//! RoomClient - the main interface for roomsync.
//!
//! This module provides [`RoomClient`], which keeps one participant's view
//! of a classroom in sync with everyone else in the room.
//!
//! # Architecture
//!
//! RoomClient drives the pure session state machine and reducer from
//! roomsync-core and interprets their results as channel I/O.
//!
//! ```text
//! Application → RoomClient → CommandChannel → Network
//!                   ↓              ↑
//!              roomsync-core   ProfileResolver
//! ```
//!
//! Local intents are applied optimistically and then broadcast. Inbound
//! commands run through the same authority predicate and the same
//! transforms, so every well-behaved client converges on the same state.
//! Every change is published to subscribers as a [`RoomSnapshot`].
//!
//! # Example
//!
//! ```ignore
//! use roomsync_client::{MemoryHub, RoomClient, RoomConfig, Role, StaticProfiles};
//!
//! let hub = MemoryHub::new();
//! let profiles = StaticProfiles::new().with_user("teacher", "Ms. Frizzle");
//! let config = RoomConfig::new("teacher", "physics-101", Role::Creator);
//! let client = RoomClient::new(config, hub.channel(), profiles);
//!
//! client.join().await?;
//! client.toggle_class_mode().await?;
//! let snapshot = client.snapshot();
//! ```

use roomsync_core::{
    accept, effective_devices, filter_speak, MessageLog, Role, RoomState, SessionAction,
    SessionEvent, SessionPhase,
};
use roomsync_types::{
    Command, CommandFrame, DeviceState, Message, MessageBody, SpeakConfig, User, UserId,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::channel::{Attributes, ChannelError, ChannelEvent, CommandChannel, CREATOR_ATTRIBUTE};
use crate::config::RoomConfig;
use crate::error::ClientError;
use crate::now_ms;
use crate::profile::{ProfileResolver, ResolveError};

/// Read model published after every state change.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    /// Session phase.
    pub phase: SessionPhase,
    /// Grouped participants, ban flag and class mode.
    pub room: RoomState,
    /// Chat log, oldest first. Shared with the client until the log changes.
    pub messages: Arc<Vec<Message>>,
    /// Whether older history has run out.
    pub history_exhausted: bool,
}

struct Inner {
    phase: SessionPhase,
    room: RoomState,
    log: MessageLog,
}

impl Inner {
    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.phase,
            room: self.room.clone(),
            messages: self.log.shared(),
            history_exhausted: self.log.is_exhausted(),
        }
    }

    fn reduce(&mut self, reduction: roomsync_core::Reduction) -> bool {
        if !reduction.changed.any() {
            return false;
        }
        self.room = reduction.state;
        true
    }
}

/// One participant's synchronized view of a room.
pub struct RoomClient<C: CommandChannel, R: ProfileResolver> {
    config: RoomConfig,
    channel: C,
    resolver: R,
    inner: Mutex<Inner>,
    /// Held for the whole of a local intent so intents broadcast in order.
    outbound: Mutex<()>,
    updates: watch::Sender<RoomSnapshot>,
}

impl<C: CommandChannel, R: ProfileResolver> RoomClient<C, R> {
    /// Create a client. Nothing happens until [`join`](Self::join).
    pub fn new(config: RoomConfig, channel: C, resolver: R) -> Self {
        let inner = Inner {
            phase: SessionPhase::new(),
            room: RoomState::new(config.user_id.clone()),
            log: MessageLog::new(),
        };
        let (updates, _) = watch::channel(inner.snapshot());
        Self {
            config,
            channel,
            resolver,
            inner: Mutex::new(inner),
            outbound: Mutex::new(()),
            updates,
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Get a reference to the underlying channel (for testing).
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.updates.borrow().clone()
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.updates.subscribe()
    }

    /// Current session phase.
    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    // ===========================================
    // Lifecycle
    // ===========================================

    /// Open the channel and build the initial room snapshot.
    ///
    /// The creator publishes itself in the channel attributes; joiners read
    /// the attribute. Membership is then resolved into grouped users and
    /// one page of history is loaded. Calling `join` on a live or left
    /// session does nothing, and a `leave` that lands while joining wins:
    /// the late channel session is closed and `join` returns `Ok(())`.
    pub async fn join(&self) -> Result<(), ClientError> {
        let actions = self.transition(SessionEvent::JoinRequested).await;
        if !actions.contains(&SessionAction::OpenChannel) {
            tracing::debug!("Join ignored in phase {:?}", self.phase().await);
            return Ok(());
        }

        if let Err(e) = self
            .channel
            .join(&self.config.user_id, &self.config.room_id)
            .await
        {
            if self.phase().await.is_torn_down() {
                tracing::debug!("Discarded join failure after leaving: {}", e);
                return Ok(());
            }
            tracing::warn!("Failed to join room {}: {}", self.config.room_id, e);
            self.fail_join(e.to_string()).await;
            return Err(ClientError::Connect(e));
        }

        let actions = self
            .transition(SessionEvent::ChannelOpened {
                role: self.config.role,
            })
            .await;
        if actions.contains(&SessionAction::CloseChannel) {
            tracing::debug!("Left before channel opened, closing it");
            self.close_channel().await;
            return Ok(());
        }

        for action in actions {
            if self.phase().await.is_torn_down() {
                tracing::debug!("Join abandoned after leaving");
                return Ok(());
            }
            if let Err(e) = self.perform(action).await {
                if self.phase().await.is_torn_down() {
                    tracing::debug!("Discarded join failure after leaving: {}", e);
                    return Ok(());
                }
                tracing::warn!("Failed to build room snapshot: {}", e);
                self.fail_join(e.to_string()).await;
                return Err(e);
            }
        }

        self.transition(SessionEvent::SnapshotApplied).await;
        if self.phase().await.is_synced() {
            tracing::info!(
                "Joined room {} as {} ({:?})",
                self.config.room_id,
                self.config.user_id,
                self.config.role
            );
        }
        Ok(())
    }

    /// Leave the room. Later results of in-flight work are discarded.
    pub async fn leave(&self) {
        let actions = self.transition(SessionEvent::LeaveRequested).await;
        if actions.contains(&SessionAction::CloseChannel) {
            self.close_channel().await;
        }
        tracing::info!("Left room {}", self.config.room_id);
    }

    async fn close_channel(&self) {
        if let Err(e) = self.channel.leave().await {
            tracing::warn!("Failed to close channel: {}", e);
        }
    }

    /// Back to `Idle` with an empty room and log, so a retry starts clean.
    async fn fail_join(&self, error: String) {
        let actions = self
            .step(|inner| {
                let (next, actions) = inner.phase.on_event(SessionEvent::JoinFailed { error });
                if next != SessionPhase::Idle {
                    return (false, actions);
                }
                inner.phase = next;
                inner.room = RoomState::new(self.config.user_id.clone());
                inner.log = MessageLog::new();
                (true, actions)
            })
            .await;
        if actions.contains(&SessionAction::CloseChannel) {
            if let Err(e) = self.channel.leave().await {
                tracing::debug!("Close after failed join: {}", e);
            }
        }
    }

    async fn perform(&self, action: SessionAction) -> Result<(), ClientError> {
        match action {
            SessionAction::PublishCreator => self.publish_creator().await,
            SessionAction::DiscoverCreator => {
                let attributes = self
                    .channel
                    .get_attributes(&self.config.room_id)
                    .await
                    .map_err(ClientError::Connect)?;
                self.apply_attributes(&attributes).await
            }
            SessionAction::BackfillHistory => {
                if self.config.backfill_on_join {
                    self.load_older_history().await?;
                }
                Ok(())
            }
            SessionAction::ResolveMembers => self.resolve_members().await,
            SessionAction::OpenChannel | SessionAction::CloseChannel => Ok(()),
        }
    }

    async fn publish_creator(&self) -> Result<(), ClientError> {
        let mut attributes = Attributes::new();
        attributes.insert(
            CREATOR_ATTRIBUTE.to_string(),
            self.config.user_id.to_string(),
        );
        self.channel
            .set_attributes(&self.config.room_id, attributes.clone())
            .await
            .map_err(ClientError::Connect)?;
        self.apply_attributes(&attributes).await
    }

    async fn resolve_members(&self) -> Result<(), ClientError> {
        let members = self.channel.members().await.map_err(ClientError::Connect)?;
        let unknown: Vec<UserId> = {
            let inner = self.inner.lock().await;
            members
                .into_iter()
                .filter(|id| !inner.room.contains(id))
                .collect()
        };
        if unknown.is_empty() {
            return Ok(());
        }

        let users = self.create_users(&unknown).await?;
        self.step(|inner| {
            if !inner.phase.is_live() {
                return (false, ());
            }
            let reduction = inner.room.insert_users(users);
            (inner.reduce(reduction), ())
        })
        .await;
        Ok(())
    }

    /// Install the creator named by `attributes`, if none is known yet.
    async fn apply_attributes(&self, attributes: &Attributes) -> Result<(), ClientError> {
        let Some(creator_id) = attributes.get(CREATOR_ATTRIBUTE) else {
            return Ok(());
        };
        let creator_id = UserId::from(creator_id.as_str());
        {
            let inner = self.inner.lock().await;
            if !inner.phase.is_live() || inner.room.creator().is_some() {
                return Ok(());
            }
        }

        let Some(creator) = self
            .create_users(std::slice::from_ref(&creator_id))
            .await?
            .pop()
        else {
            return Ok(());
        };

        let installed = self
            .step(|inner| {
                if !inner.phase.is_live() || inner.room.creator().is_some() {
                    return (false, false);
                }
                let reduction = inner.room.set_creator(creator);
                (inner.reduce(reduction), true)
            })
            .await;
        if installed {
            tracing::info!("Room creator is {}", creator_id);
        }
        Ok(())
    }

    /// Resolve profiles and build fresh user records.
    async fn create_users(&self, ids: &[UserId]) -> Result<Vec<User>, ClientError> {
        let profiles = self.resolver.resolve(&self.config.room_id, ids).await?;
        ids.iter()
            .map(|id| {
                let profile = profiles
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ResolveError::Unknown(id.clone()))?;
                Ok(User::from_profile(
                    id.clone(),
                    profile,
                    &self.config.user_id,
                ))
            })
            .collect()
    }

    // ===========================================
    // Local intents
    // ===========================================

    /// Creator: put a participant with a raised hand on stage.
    pub async fn accept_raise_hand(&self, user: impl Into<UserId>) -> Result<(), ClientError> {
        let user = user.into();
        self.intent(false, |_| {
            Some(Command::AcceptRaiseHand { user, accept: true })
        })
        .await
    }

    /// Put participants on or off stage.
    ///
    /// Entries the local user may not apply are dropped before anything is
    /// sent; if none remain nothing happens.
    pub async fn speak(&self, configs: Vec<SpeakConfig>) -> Result<(), ClientError> {
        let me = self.config.user_id.clone();
        let role = self.config.role;
        self.intent(false, move |room| {
            let allowed = filter_speak(&configs, &me, role, room);
            (!allowed.is_empty()).then_some(Command::Speak(allowed))
        })
        .await
    }

    /// Send a chat message.
    ///
    /// Silently dropped while chat is muted, unless the local user is the
    /// creator. The message is added to the local log only after the
    /// channel accepted it.
    pub async fn send_message(&self, text: &str) -> Result<(), ClientError> {
        let _order = self.outbound.lock().await;
        let command = Command::ChannelMessage(text.to_string());
        let me = &self.config.user_id;
        let role = self.config.role;

        let admitted = self
            .step(|inner| (false, admit(inner, &command, me, role)))
            .await?;
        if !admitted {
            return Ok(());
        }

        self.channel.send_text(text).await.map_err(|e| {
            tracing::warn!("Failed to send chat message: {}", e);
            ClientError::Send(e)
        })?;

        self.step(|inner| {
            if !inner.phase.is_live() {
                return (false, ());
            }
            (apply_command(inner, me, role, &command, now_ms()), ())
        })
        .await;
        Ok(())
    }

    /// Creator: lower every raised hand.
    pub async fn cancel_all_hand_raising(&self) -> Result<(), ClientError> {
        self.intent(true, |_| Some(Command::CancelAllHandRaising))
            .await
    }

    /// Joiner: raise or lower the local hand.
    ///
    /// Does nothing for the creator or while the local user is on stage.
    pub async fn toggle_hand_raising(&self) -> Result<(), ClientError> {
        if self.config.role == Role::Creator {
            return Ok(());
        }
        self.intent(true, |room| {
            let me = room.current_user()?;
            (!me.is_speaking).then(|| Command::RaiseHand(!me.is_hand_raised))
        })
        .await
    }

    /// Creator: mute or unmute chat for everyone else.
    pub async fn toggle_ban(&self) -> Result<(), ClientError> {
        self.intent(true, |room| Some(Command::BanText(!room.is_banned())))
            .await
    }

    /// Set a participant's camera and microphone.
    ///
    /// Participants control their own devices. The creator may also turn
    /// someone else's devices off, but never on.
    pub async fn update_device_state(
        &self,
        user: impl Into<UserId>,
        camera: bool,
        mic: bool,
    ) -> Result<(), ClientError> {
        let user = user.into();
        let me = self.config.user_id.clone();
        self.intent(true, move |room| {
            let target = room.find(&user)?;
            let (camera, mic) = effective_devices(&me, target, camera, mic);
            if camera == target.camera && mic == target.mic {
                return None;
            }
            Some(Command::DeviceState(DeviceState { user, camera, mic }))
        })
        .await
    }

    /// Creator: switch between lecture and interaction mode.
    pub async fn toggle_class_mode(&self) -> Result<(), ClientError> {
        self.intent(false, |room| {
            Some(Command::ClassMode(room.class_mode().toggled()))
        })
        .await
    }

    /// Creator: post a notice to the chat log.
    ///
    /// With `keep_in_history` the notice is retained by the channel and
    /// shows up for participants who join later.
    pub async fn send_notice(&self, text: &str, keep_in_history: bool) -> Result<(), ClientError> {
        let text = text.to_string();
        self.intent(keep_in_history, move |_| {
            Some(if keep_in_history {
                Command::HistoryNotice(text)
            } else {
                Command::Notice(text)
            })
        })
        .await
    }

    /// Load one older page of chat history.
    ///
    /// Returns how many messages were added. Once a page comes back empty,
    /// or a query fails, no further pages are requested.
    pub async fn load_older_history(&self) -> Result<usize, ClientError> {
        let window = {
            let inner = self.inner.lock().await;
            match inner.phase {
                SessionPhase::Idle => return Err(ClientError::NotJoined),
                SessionPhase::TornDown => return Ok(0),
                SessionPhase::Joining | SessionPhase::Synced => {}
            }
            inner
                .log
                .older_window(now_ms(), self.config.history_window_ms())
        };
        let Some(window) = window else {
            return Ok(0);
        };

        let page = match self
            .channel
            .fetch_history(window.from_ms, window.to_ms)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("History query failed, giving up on older pages: {}", e);
                self.step(|inner| {
                    let changed = !inner.log.is_exhausted();
                    inner.log.mark_exhausted();
                    (changed, ())
                })
                .await;
                return Ok(0);
            }
        };

        let added = self
            .step(|inner| {
                if !inner.phase.is_live() {
                    return (false, 0);
                }
                let was_exhausted = inner.log.is_exhausted();
                let added = inner.log.prepend_older(page);
                (added > 0 || inner.log.is_exhausted() != was_exhausted, added)
            })
            .await;
        tracing::debug!("Loaded {} older messages", added);
        Ok(added)
    }

    /// Apply a local intent and broadcast it.
    ///
    /// `build` derives the command from the current state, or returns
    /// `None` when there is nothing to do. The command is checked against
    /// the authority rules, applied locally, then sent. A failed send is
    /// reported but the local change stays.
    async fn intent<F>(&self, need_history: bool, build: F) -> Result<(), ClientError>
    where
        F: FnOnce(&RoomState) -> Option<Command> + Send,
    {
        let _order = self.outbound.lock().await;
        let me = &self.config.user_id;
        let role = self.config.role;

        let command = self
            .step(|inner| {
                match admit_phase(inner.phase) {
                    Err(e) => return (false, Err(e)),
                    Ok(false) => return (false, Ok(None)),
                    Ok(true) => {}
                }
                let Some(command) = build(&inner.room) else {
                    return (false, Ok(None));
                };
                if !accept(&command, me, role, &inner.room) {
                    tracing::debug!(
                        "Refused local {} intent",
                        command.command_type().as_str()
                    );
                    return (false, Ok(None));
                }
                let changed = apply_command(inner, me, role, &command, now_ms());
                (changed, Ok(Some(command)))
            })
            .await?;

        match command {
            Some(command) => self.broadcast(command, need_history).await,
            None => Ok(()),
        }
    }

    async fn broadcast(&self, command: Command, need_history: bool) -> Result<(), ClientError> {
        if self.inner.lock().await.phase.is_torn_down() {
            tracing::debug!("Suppressed broadcast after leaving");
            return Ok(());
        }
        let frame = CommandFrame::new(command, need_history);
        self.channel.send_command(&frame).await.map_err(|e| {
            tracing::warn!(
                "Failed to broadcast {}: {}",
                frame.command.command_type().as_str(),
                e
            );
            ClientError::Send(e)
        })
    }

    // ===========================================
    // Inbound
    // ===========================================

    /// Apply one inbound channel event.
    pub async fn handle_event(&self, event: ChannelEvent) -> Result<(), ClientError> {
        match event {
            ChannelEvent::Command { sender, frame } => {
                self.apply_remote(sender, frame.command).await;
                Ok(())
            }
            ChannelEvent::Text { sender, text } => {
                self.apply_remote(sender, Command::ChannelMessage(text))
                    .await;
                Ok(())
            }
            ChannelEvent::MemberJoined(id) => self.member_joined(id).await,
            ChannelEvent::MemberLeft(id) => {
                self.step(|inner| {
                    if !inner.phase.is_live() {
                        return (false, ());
                    }
                    let reduction = inner.room.remove_user(&id);
                    (inner.reduce(reduction), ())
                })
                .await;
                Ok(())
            }
            ChannelEvent::AttributesUpdated(attributes) => {
                self.apply_attributes(&attributes).await
            }
        }
    }

    /// Process inbound events until the channel reports no more.
    ///
    /// For a network channel that means until it closes; an in-process
    /// channel stops once its inbox is drained. Failures applying a single
    /// event are logged and skipped. Returns how many events were handled.
    pub async fn run(&self) -> Result<usize, ClientError> {
        let mut handled = 0;
        loop {
            if self.phase().await.is_torn_down() {
                break;
            }
            let event = match self.channel.recv().await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(ChannelError::Malformed(reason)) => {
                    tracing::warn!("Dropped malformed frame: {}", reason);
                    continue;
                }
                Err(e) => return Err(ClientError::Receive(e)),
            };
            if let Err(e) = self.handle_event(event).await {
                tracing::warn!("Failed to apply channel event: {}", e);
            }
            handled += 1;
        }
        Ok(handled)
    }

    async fn apply_remote(&self, sender: UserId, command: Command) {
        let me = &self.config.user_id;
        let role = self.config.role;
        self.step(|inner| {
            if !inner.phase.is_live() || &sender == me {
                return (false, ());
            }
            if !accept(&command, &sender, role, &inner.room) {
                tracing::debug!(
                    "Dropped {} from {}: not permitted",
                    command.command_type().as_str(),
                    sender
                );
                return (false, ());
            }
            (apply_command(inner, &sender, role, &command, now_ms()), ())
        })
        .await
    }

    async fn member_joined(&self, id: UserId) -> Result<(), ClientError> {
        {
            let inner = self.inner.lock().await;
            if !inner.phase.is_live() || inner.room.contains(&id) {
                return Ok(());
            }
        }
        let users = self.create_users(std::slice::from_ref(&id)).await?;
        self.step(|inner| {
            if !inner.phase.is_live() {
                return (false, ());
            }
            let reduction = inner.room.insert_users(users);
            (inner.reduce(reduction), ())
        })
        .await;
        tracing::debug!("{} joined", id);
        Ok(())
    }

    // ===========================================
    // State plumbing
    // ===========================================

    /// Run one state step under the lock and publish if it changed anything.
    async fn step<T>(&self, f: impl FnOnce(&mut Inner) -> (bool, T)) -> T {
        let mut inner = self.inner.lock().await;
        let (changed, out) = f(&mut inner);
        if changed {
            self.updates.send_replace(inner.snapshot());
        }
        out
    }

    async fn transition(&self, event: SessionEvent) -> Vec<SessionAction> {
        self.step(|inner| {
            let (next, actions) = inner.phase.on_event(event);
            let changed = next != inner.phase;
            inner.phase = next;
            (changed, actions)
        })
        .await
    }
}

/// Whether local intents are accepted in `phase`.
///
/// `Ok(false)` means the session was left and the intent is a no-op.
fn admit_phase(phase: SessionPhase) -> Result<bool, ClientError> {
    match phase {
        SessionPhase::Idle => Err(ClientError::NotJoined),
        SessionPhase::TornDown => Ok(false),
        SessionPhase::Joining | SessionPhase::Synced => Ok(true),
    }
}

fn admit(inner: &Inner, command: &Command, me: &UserId, role: Role) -> Result<bool, ClientError> {
    if !admit_phase(inner.phase)? {
        return Ok(false);
    }
    if !accept(command, me, role, &inner.room) {
        tracing::debug!("Refused local {} intent", command.command_type().as_str());
        return Ok(false);
    }
    Ok(true)
}

/// Replace `user` with an edited copy, or `None` if the edit changed nothing.
fn update(user: &User, edit: impl FnOnce(&mut User)) -> Option<User> {
    let mut next = user.clone();
    edit(&mut next);
    (next != *user).then_some(next)
}

fn set_speaking(user: &mut User, speak: bool) {
    user.is_hand_raised = false;
    user.is_speaking = speak;
    if !speak {
        user.camera = false;
        user.mic = false;
    }
}

/// Apply an accepted command from `sender`. Returns true if state changed.
fn apply_command(
    inner: &mut Inner,
    sender: &UserId,
    role: Role,
    command: &Command,
    now: u64,
) -> bool {
    match command {
        Command::RaiseHand(raise) => {
            let reduction = inner.room.map_users(|user| {
                if &user.id != sender || (*raise && user.is_speaking) {
                    return None;
                }
                update(user, |u| u.is_hand_raised = *raise)
            });
            inner.reduce(reduction)
        }
        Command::AcceptRaiseHand { user: target, accept } => {
            let reduction = inner.room.map_users(|user| {
                if &user.id != target {
                    return None;
                }
                update(user, |u| {
                    u.is_hand_raised = false;
                    u.is_speaking = *accept;
                    u.camera = false;
                    u.mic = *accept;
                })
            });
            inner.reduce(reduction)
        }
        Command::Speak(configs) => {
            let allowed = filter_speak(configs, sender, role, &inner.room);
            let reduction = inner.room.map_users(|user| {
                let config = allowed.iter().rev().find(|c| c.user == user.id)?;
                update(user, |u| set_speaking(u, config.speak))
            });
            inner.reduce(reduction)
        }
        Command::DeviceState(state) => {
            let reduction = inner.room.map_users(|user| {
                if user.id != state.user {
                    return None;
                }
                let (camera, mic) = effective_devices(sender, user, state.camera, state.mic);
                update(user, |u| {
                    u.camera = camera;
                    u.mic = mic;
                    u.is_speaking = u.is_speaking && (camera || mic);
                })
            });
            inner.reduce(reduction)
        }
        Command::CancelAllHandRaising => {
            let reduction = inner.room.map_users(|user| {
                if !user.is_hand_raised {
                    return None;
                }
                update(user, |u| u.is_hand_raised = false)
            });
            inner.reduce(reduction)
        }
        Command::BanText(banned) => {
            inner.room.set_banned(*banned);
            inner
                .log
                .append(Message::new(MessageBody::Ban(*banned), sender.clone(), now));
            true
        }
        Command::ClassMode(mode) => inner.room.set_class_mode(*mode),
        Command::ChannelMessage(text) => inner.log.append(Message::new(
            MessageBody::Chat(text.clone()),
            sender.clone(),
            now,
        )),
        Command::Notice(text) | Command::HistoryNotice(text) => inner.log.append(Message::new(
            MessageBody::Notice(text.clone()),
            sender.clone(),
            now,
        )),
    }
}
