//! Role-based authority checks.
//!
//! There is no trusted server: every client runs these predicates both
//! before emitting a command and on every command it receives. Well-behaved
//! clients therefore converge even when a misbehaving peer broadcasts
//! commands it is not entitled to.

use roomsync_types::{Command, DeviceState, SpeakConfig, User, UserId};
use serde::{Deserialize, Serialize};

use crate::reducer::RoomState;

/// The local participant's role in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The room owner.
    Creator,
    /// Any other participant.
    Joiner,
}

/// Whether `sender` holds creator authority in `state`.
///
/// The creator is whoever the channel attribute names. Before that attribute
/// has been observed, a client whose own role is [`Role::Creator`] still
/// treats itself as the creator.
pub fn is_creator(sender: &UserId, role: Role, state: &RoomState) -> bool {
    match state.creator_id() {
        Some(creator) => creator == sender,
        None => role == Role::Creator && sender == state.current_user_id(),
    }
}

/// Decide whether `command` from `sender` may be applied to `state`.
///
/// A rejected command is dropped silently by the caller; rejection is normal
/// protocol traffic, not an error.
pub fn accept(command: &Command, sender: &UserId, role: Role, state: &RoomState) -> bool {
    let creator = is_creator(sender, role, state);
    if command.command_type().is_creator_only() {
        return creator;
    }
    match command {
        Command::RaiseHand(raise) => {
            let speaking = state.find(sender).is_some_and(|user| user.is_speaking);
            !*raise || !speaking
        }
        Command::Speak(configs) => !filter_speak(configs, sender, role, state).is_empty(),
        Command::DeviceState(DeviceState { user, .. }) => user == sender || creator,
        Command::ChannelMessage(_) => !state.is_banned() || creator,
        Command::AcceptRaiseHand { .. }
        | Command::CancelAllHandRaising
        | Command::BanText(_)
        | Command::ClassMode(_)
        | Command::Notice(_)
        | Command::HistoryNotice(_) => creator,
    }
}

/// Keep the entries of a speak batch that `sender` may apply.
///
/// The creator may put anyone on or off stage; everyone else may only take
/// themselves off stage.
pub fn filter_speak(
    configs: &[SpeakConfig],
    sender: &UserId,
    role: Role,
    state: &RoomState,
) -> Vec<SpeakConfig> {
    if is_creator(sender, role, state) {
        return configs.to_vec();
    }
    configs
        .iter()
        .filter(|config| !config.speak && &config.user == sender)
        .cloned()
        .collect()
}

/// Device values to apply when `requester` asks to set `target`'s devices.
///
/// Participants control their own devices fully. The creator may only turn
/// another participant's devices off, never on.
pub fn effective_devices(
    requester: &UserId,
    target: &User,
    camera: bool,
    mic: bool,
) -> (bool, bool) {
    if requester == &target.id {
        (camera, mic)
    } else {
        (target.camera && camera, target.mic && mic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_types::{ClassMode, MediaId};

    fn user(id: &str) -> User {
        User {
            id: UserId::from(id),
            media_id: MediaId::new(1),
            avatar: String::new(),
            name: id.to_string(),
            camera: true,
            mic: true,
            is_speaking: false,
            is_hand_raised: false,
        }
    }

    fn room(me: &str) -> RoomState {
        RoomState::new(UserId::from(me))
            .set_creator(user("teacher"))
            .state
            .insert_users(vec![user("a"), user("b")])
            .state
    }

    fn id(s: &str) -> UserId {
        UserId::from(s)
    }

    #[test]
    fn creator_only_commands_require_creator() {
        let state = room("a");
        let creator_only = [
            Command::AcceptRaiseHand {
                user: id("a"),
                accept: true,
            },
            Command::CancelAllHandRaising,
            Command::BanText(true),
            Command::ClassMode(ClassMode::Interaction),
            Command::Notice("quiet please".into()),
            Command::HistoryNotice("homework".into()),
        ];
        for command in &creator_only {
            assert!(accept(command, &id("teacher"), Role::Joiner, &state));
            assert!(!accept(command, &id("b"), Role::Joiner, &state));
        }
    }

    #[test]
    fn accept_agrees_with_command_type_classification() {
        let state = room("a");
        let commands = [
            Command::RaiseHand(true),
            Command::AcceptRaiseHand {
                user: id("b"),
                accept: true,
            },
            Command::Speak(vec![SpeakConfig::new("b", false)]),
            Command::DeviceState(DeviceState {
                user: id("b"),
                camera: false,
                mic: false,
            }),
            Command::CancelAllHandRaising,
            Command::BanText(false),
            Command::ClassMode(ClassMode::Lecture),
            Command::ChannelMessage("hi".into()),
            Command::Notice("n".into()),
            Command::HistoryNotice("h".into()),
        ];
        for command in &commands {
            let by_joiner = accept(command, &id("b"), Role::Joiner, &state);
            assert_eq!(
                by_joiner,
                !command.command_type().is_creator_only(),
                "{:?}",
                command
            );
        }
    }

    #[test]
    fn own_creator_role_counts_before_attribute_is_known() {
        let state = RoomState::new(id("teacher"));
        let command = Command::ClassMode(ClassMode::Interaction);
        assert!(accept(&command, &id("teacher"), Role::Creator, &state));
        assert!(!accept(&command, &id("teacher"), Role::Joiner, &state));
        assert!(!accept(&command, &id("someone"), Role::Creator, &state));
    }

    #[test]
    fn raise_hand_refused_while_speaking() {
        let state = room("teacher")
            .map_users(|u| {
                (u.id.as_str() == "a").then(|| User {
                    is_speaking: true,
                    ..u.clone()
                })
            })
            .state;
        assert!(!accept(&Command::RaiseHand(true), &id("a"), Role::Creator, &state));
        assert!(accept(&Command::RaiseHand(false), &id("a"), Role::Creator, &state));
        assert!(accept(&Command::RaiseHand(true), &id("b"), Role::Creator, &state));
    }

    #[test]
    fn non_creator_speak_on_peer_is_dropped() {
        let state = room("teacher");
        let batch = Command::Speak(vec![SpeakConfig::new("b", true)]);
        assert!(!accept(&batch, &id("a"), Role::Creator, &state));
    }

    #[test]
    fn non_creator_may_only_leave_stage_themselves() {
        let state = room("teacher");
        let configs = vec![
            SpeakConfig::new("a", false),
            SpeakConfig::new("a", true),
            SpeakConfig::new("b", false),
        ];
        let kept = filter_speak(&configs, &id("a"), Role::Creator, &state);
        assert_eq!(kept, vec![SpeakConfig::new("a", false)]);

        let all = filter_speak(&configs, &id("teacher"), Role::Joiner, &state);
        assert_eq!(all, configs);
    }

    #[test]
    fn device_state_for_self_or_by_creator() {
        let state = room("b");
        let own = Command::DeviceState(DeviceState {
            user: id("a"),
            camera: true,
            mic: true,
        });
        assert!(accept(&own, &id("a"), Role::Joiner, &state));
        assert!(accept(&own, &id("teacher"), Role::Joiner, &state));
        assert!(!accept(&own, &id("b"), Role::Joiner, &state));
    }

    #[test]
    fn creator_can_only_downgrade_other_devices() {
        let mut target = user("a");
        target.camera = false;
        target.mic = true;

        assert_eq!(
            effective_devices(&id("teacher"), &target, true, false),
            (false, false)
        );
        assert_eq!(
            effective_devices(&id("teacher"), &target, true, true),
            (false, true)
        );
        assert_eq!(effective_devices(&id("a"), &target, true, true), (true, true));
    }

    #[test]
    fn chat_is_gated_by_ban() {
        let mut state = room("a");
        let chat = Command::ChannelMessage("hello".into());
        assert!(accept(&chat, &id("b"), Role::Joiner, &state));

        state.set_banned(true);
        assert!(!accept(&chat, &id("b"), Role::Joiner, &state));
        assert!(!accept(&chat, &id("a"), Role::Joiner, &state));
        assert!(accept(&chat, &id("teacher"), Role::Joiner, &state));
    }
}
