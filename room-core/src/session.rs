//! Room session lifecycle state machine.
//!
//! Pure, side-effect-free: it takes events and produces the next phase plus
//! the actions the client must perform. The I/O itself (opening the channel,
//! resolving profiles, fetching history) happens in roomsync-client.

use crate::authority::Role;

/// Lifecycle phase of one room session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing started yet.
    #[default]
    Idle,
    /// Channel opening and initial snapshot in progress.
    Joining,
    /// Steady state: intents and inbound commands are applied.
    Synced,
    /// Left the room. Terminal.
    TornDown,
}

/// Inputs to the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The application asked to join.
    JoinRequested,
    /// The channel session is open.
    ChannelOpened {
        /// Local role, which decides how the creator is discovered.
        role: Role,
    },
    /// Joining failed.
    JoinFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// Initial membership and creator are applied.
    SnapshotApplied,
    /// The application asked to leave.
    LeaveRequested,
}

/// Actions the client performs in response to a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the channel session.
    OpenChannel,
    /// Publish the local user as creator and install it.
    PublishCreator,
    /// Read the creator attribute and install the creator it names.
    DiscoverCreator,
    /// Fetch one page of older messages.
    BackfillHistory,
    /// Fetch membership and resolve every member's profile.
    ResolveMembers,
    /// Close the channel session.
    CloseChannel,
}

impl SessionPhase {
    /// Create a new state machine in the Idle phase.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new phase plus actions to execute.
    pub fn on_event(self, event: SessionEvent) -> (Self, Vec<SessionAction>) {
        match (self, event) {
            (Self::Idle, SessionEvent::JoinRequested) => {
                (Self::Joining, vec![SessionAction::OpenChannel])
            }
            (Self::Joining, SessionEvent::ChannelOpened { role }) => {
                let creator = match role {
                    Role::Creator => SessionAction::PublishCreator,
                    Role::Joiner => SessionAction::DiscoverCreator,
                };
                (
                    Self::Joining,
                    vec![
                        creator,
                        SessionAction::BackfillHistory,
                        SessionAction::ResolveMembers,
                    ],
                )
            }
            (Self::Joining, SessionEvent::SnapshotApplied) => (Self::Synced, vec![]),
            (Self::Joining, SessionEvent::JoinFailed { .. }) => {
                (Self::Idle, vec![SessionAction::CloseChannel])
            }
            (Self::Joining | Self::Synced, SessionEvent::LeaveRequested) => {
                (Self::TornDown, vec![SessionAction::CloseChannel])
            }
            (Self::Idle, SessionEvent::LeaveRequested) => (Self::TornDown, vec![]),
            // Left while the channel was still opening: close the late session.
            (Self::TornDown, SessionEvent::ChannelOpened { .. }) => {
                (Self::TornDown, vec![SessionAction::CloseChannel])
            }

            // Invalid transitions - stay in current phase
            (phase, _) => (phase, vec![]),
        }
    }

    /// Whether local intents and inbound commands are applied.
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }

    /// Whether inbound events may touch state (joining or synced).
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Joining | Self::Synced)
    }

    /// Whether the session has been left.
    pub fn is_torn_down(&self) -> bool {
        matches!(self, Self::TornDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(SessionPhase::new(), SessionPhase::Idle);
    }

    #[test]
    fn join_opens_channel() {
        let (phase, actions) = SessionPhase::Idle.on_event(SessionEvent::JoinRequested);
        assert_eq!(phase, SessionPhase::Joining);
        assert_eq!(actions, vec![SessionAction::OpenChannel]);
    }

    #[test]
    fn creator_publishes_joiner_discovers() {
        let (_, actions) = SessionPhase::Joining.on_event(SessionEvent::ChannelOpened {
            role: Role::Creator,
        });
        assert_eq!(actions[0], SessionAction::PublishCreator);

        let (phase, actions) = SessionPhase::Joining.on_event(SessionEvent::ChannelOpened {
            role: Role::Joiner,
        });
        assert_eq!(phase, SessionPhase::Joining);
        assert_eq!(
            actions,
            vec![
                SessionAction::DiscoverCreator,
                SessionAction::BackfillHistory,
                SessionAction::ResolveMembers,
            ]
        );
    }

    #[test]
    fn snapshot_completes_join() {
        let (phase, _) = SessionPhase::Joining.on_event(SessionEvent::SnapshotApplied);
        assert!(phase.is_synced());
    }

    #[test]
    fn join_failure_returns_to_idle() {
        let (phase, actions) = SessionPhase::Joining.on_event(SessionEvent::JoinFailed {
            error: "unreachable".into(),
        });
        assert_eq!(phase, SessionPhase::Idle);
        assert!(actions.contains(&SessionAction::CloseChannel));
    }

    #[test]
    fn leave_is_terminal_from_any_phase() {
        for phase in [SessionPhase::Idle, SessionPhase::Joining, SessionPhase::Synced] {
            let (next, _) = phase.on_event(SessionEvent::LeaveRequested);
            assert!(next.is_torn_down());
        }

        let (next, actions) = SessionPhase::TornDown.on_event(SessionEvent::JoinRequested);
        assert!(next.is_torn_down());
        assert!(actions.is_empty());
    }

    #[test]
    fn late_snapshot_after_leave_is_ignored() {
        let (phase, actions) = SessionPhase::TornDown.on_event(SessionEvent::SnapshotApplied);
        assert_eq!(phase, SessionPhase::TornDown);
        assert!(actions.is_empty());
    }

    #[test]
    fn channel_opened_after_leave_closes_it() {
        let (phase, actions) = SessionPhase::TornDown.on_event(SessionEvent::ChannelOpened {
            role: Role::Joiner,
        });
        assert_eq!(phase, SessionPhase::TornDown);
        assert_eq!(actions, vec![SessionAction::CloseChannel]);
    }

    #[test]
    fn liveness_helpers() {
        assert!(!SessionPhase::Idle.is_live());
        assert!(SessionPhase::Joining.is_live());
        assert!(SessionPhase::Synced.is_live());
        assert!(!SessionPhase::TornDown.is_live());
        assert!(!SessionPhase::Joining.is_synced());
    }
}
