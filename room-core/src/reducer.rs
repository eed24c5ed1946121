//! Grouped participant state and the reducer that maintains it.
//!
//! Every known participant lives in exactly one group:
//!
//! ```text
//! creator | speaking | hand_raising | joiners
//! ```
//!
//! Groups are shared slices (`Arc<Vec<Arc<User>>>`). A reduction only copies
//! a group once a change actually touches it, and unchanged users keep their
//! `Arc`. Consumers detect what moved with `Arc::ptr_eq` instead of comparing
//! contents, so a step costs O(changed users) for untouched groups.

use std::collections::HashSet;
use std::sync::Arc;

use roomsync_types::{ClassMode, User, UserId};

/// A shared, ordered group of participants.
pub type Group = Arc<Vec<Arc<User>>>;

/// Which parts of the grouped state a reduction replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangedGroups {
    /// The creator slot changed.
    pub creator: bool,
    /// The speaking group was rebuilt.
    pub speaking: bool,
    /// The hand-raising group was rebuilt.
    pub hand_raising: bool,
    /// The joiners group was rebuilt.
    pub joiners: bool,
}

impl ChangedGroups {
    /// True if anything changed.
    pub fn any(&self) -> bool {
        self.creator || self.speaking || self.hand_raising || self.joiners
    }
}

/// Result of a reducer step.
#[derive(Debug, Clone)]
pub struct Reduction {
    /// The next state. Equal by reference to the input when nothing changed.
    pub state: RoomState,
    /// What changed.
    pub changed: ChangedGroups,
}

/// The local view of a room.
#[derive(Debug, Clone)]
pub struct RoomState {
    creator: Option<Arc<User>>,
    speaking: Group,
    hand_raising: Group,
    joiners: Group,
    current_user_id: UserId,
    is_banned: bool,
    class_mode: ClassMode,
}

impl RoomState {
    /// Empty room as seen by `current_user_id`.
    pub fn new(current_user_id: UserId) -> Self {
        Self {
            creator: None,
            speaking: Arc::default(),
            hand_raising: Arc::default(),
            joiners: Arc::default(),
            current_user_id,
            is_banned: false,
            class_mode: ClassMode::default(),
        }
    }

    /// The room creator, once discovered.
    pub fn creator(&self) -> Option<&Arc<User>> {
        self.creator.as_ref()
    }

    /// Identifier of the room creator, once discovered.
    pub fn creator_id(&self) -> Option<&UserId> {
        self.creator.as_deref().map(|user| &user.id)
    }

    /// Participants on stage.
    pub fn speaking(&self) -> &Group {
        &self.speaking
    }

    /// Participants waiting with a raised hand.
    pub fn hand_raising(&self) -> &Group {
        &self.hand_raising
    }

    /// Everyone else. The local user comes first when present.
    pub fn joiners(&self) -> &Group {
        &self.joiners
    }

    /// The local participant's id.
    pub fn current_user_id(&self) -> &UserId {
        &self.current_user_id
    }

    /// The local participant's record, wherever it is grouped.
    pub fn current_user(&self) -> Option<&Arc<User>> {
        self.find(&self.current_user_id)
    }

    /// Whether chat is muted for non-creators.
    pub fn is_banned(&self) -> bool {
        self.is_banned
    }

    /// Current class mode.
    pub fn class_mode(&self) -> ClassMode {
        self.class_mode
    }

    /// Set the ban flag. Returns true if it changed.
    pub fn set_banned(&mut self, banned: bool) -> bool {
        let changed = self.is_banned != banned;
        self.is_banned = banned;
        changed
    }

    /// Set the class mode. Returns true if it changed.
    pub fn set_class_mode(&mut self, mode: ClassMode) -> bool {
        let changed = self.class_mode != mode;
        self.class_mode = mode;
        changed
    }

    /// Every known participant: creator first, then each group in order.
    pub fn users(&self) -> impl Iterator<Item = &Arc<User>> {
        self.creator
            .iter()
            .chain(self.speaking.iter())
            .chain(self.hand_raising.iter())
            .chain(self.joiners.iter())
    }

    /// Look up a participant by id.
    pub fn find(&self, id: &UserId) -> Option<&Arc<User>> {
        self.users().find(|user| &user.id == id)
    }

    /// Whether `id` is known in any group.
    pub fn contains(&self, id: &UserId) -> bool {
        self.find(id).is_some()
    }

    /// Apply `f` to every participant and regroup the ones it changed.
    ///
    /// `f` returns `None` to leave a user untouched and `Some(updated)` to
    /// replace it. Changed users are pulled out of their group and
    /// reclassified in the order they were visited.
    pub fn map_users<F>(&self, mut f: F) -> Reduction
    where
        F: FnMut(&User) -> Option<User>,
    {
        let mut next = Regroup::new(self);
        let mut unsorted = Vec::new();

        if let Some(creator) = &self.creator {
            if let Some(updated) = f(creator) {
                next.creator = Some(Arc::new(updated));
                next.changed_creator = true;
            }
        }

        next.speaking = extract_changed(&self.speaking, &mut f, &mut unsorted);
        next.hand_raising = extract_changed(&self.hand_raising, &mut f, &mut unsorted);
        next.joiners = extract_changed(&self.joiners, &mut f, &mut unsorted);

        for user in unsorted {
            next.place(user);
        }
        next.finish()
    }

    /// Classify freshly resolved participants into their groups.
    ///
    /// Users already known are skipped, and a repeated id within `users`
    /// keeps its first occurrence, so duplicate membership events are
    /// harmless.
    pub fn insert_users(&self, users: Vec<User>) -> Reduction {
        let mut next = Regroup::new(self);
        let mut seen: HashSet<UserId> = self.users().map(|user| user.id.clone()).collect();

        for user in users {
            if seen.insert(user.id.clone()) {
                next.place(user);
            }
        }
        next.finish()
    }

    /// Drop a participant who left the channel.
    ///
    /// The creator slot is kept: the creator's identity comes from the
    /// channel attribute, not from membership.
    pub fn remove_user(&self, id: &UserId) -> Reduction {
        let mut next = Regroup::new(self);
        next.speaking = without(&self.speaking, id);
        next.hand_raising = without(&self.hand_raising, id);
        next.joiners = without(&self.joiners, id);
        next.finish()
    }

    /// Install the creator, removing that id from every other group.
    pub fn set_creator(&self, creator: User) -> Reduction {
        let mut next = Regroup::new(self);
        next.speaking = without(&self.speaking, &creator.id);
        next.hand_raising = without(&self.hand_raising, &creator.id);
        next.joiners = without(&self.joiners, &creator.id);
        next.creator = Some(Arc::new(creator));
        next.changed_creator = true;
        next.finish()
    }
}

/// Copy `group` minus the users `f` changed, pushing those to `unsorted`.
///
/// Returns `None` (reuse the original) if `f` changed nobody.
fn extract_changed<F>(
    group: &Group,
    f: &mut F,
    unsorted: &mut Vec<User>,
) -> Option<Vec<Arc<User>>>
where
    F: FnMut(&User) -> Option<User>,
{
    let mut rebuilt: Option<Vec<Arc<User>>> = None;
    for (index, user) in group.iter().enumerate() {
        match f(user) {
            Some(updated) => {
                rebuilt.get_or_insert_with(|| group[..index].to_vec());
                unsorted.push(updated);
            }
            None => {
                if let Some(rebuilt) = rebuilt.as_mut() {
                    rebuilt.push(Arc::clone(user));
                }
            }
        }
    }
    rebuilt
}

/// Copy `group` without `id`, or `None` if `id` is not in it.
fn without(group: &Group, id: &UserId) -> Option<Vec<Arc<User>>> {
    if !group.iter().any(|user| &user.id == id) {
        return None;
    }
    Some(
        group
            .iter()
            .filter(|user| &user.id != id)
            .cloned()
            .collect(),
    )
}

/// Lazily rebuilt groups of one reduction.
struct Regroup<'a> {
    base: &'a RoomState,
    creator: Option<Arc<User>>,
    changed_creator: bool,
    speaking: Option<Vec<Arc<User>>>,
    hand_raising: Option<Vec<Arc<User>>>,
    joiners: Option<Vec<Arc<User>>>,
}

impl<'a> Regroup<'a> {
    fn new(base: &'a RoomState) -> Self {
        Self {
            base,
            creator: base.creator.clone(),
            changed_creator: false,
            speaking: None,
            hand_raising: None,
            joiners: None,
        }
    }

    /// Single-pass classification of one changed or new user.
    fn place(&mut self, user: User) {
        let base = self.base;
        let is_creator = self
            .creator
            .as_deref()
            .is_some_and(|creator| creator.id == user.id);

        if is_creator {
            self.creator = Some(Arc::new(user));
            self.changed_creator = true;
        } else if user.is_speaking {
            self.speaking
                .get_or_insert_with(|| base.speaking.to_vec())
                .push(Arc::new(user));
        } else if user.is_hand_raised {
            self.hand_raising
                .get_or_insert_with(|| base.hand_raising.to_vec())
                .push(Arc::new(user));
        } else if user.id == base.current_user_id {
            self.joiners
                .get_or_insert_with(|| base.joiners.to_vec())
                .insert(0, Arc::new(user));
        } else {
            self.joiners
                .get_or_insert_with(|| base.joiners.to_vec())
                .push(Arc::new(user));
        }
    }

    fn finish(self) -> Reduction {
        let changed = ChangedGroups {
            creator: self.changed_creator,
            speaking: self.speaking.is_some(),
            hand_raising: self.hand_raising.is_some(),
            joiners: self.joiners.is_some(),
        };
        let base = self.base;
        let state = RoomState {
            creator: self.creator,
            speaking: self
                .speaking
                .map(Arc::new)
                .unwrap_or_else(|| Arc::clone(&base.speaking)),
            hand_raising: self
                .hand_raising
                .map(Arc::new)
                .unwrap_or_else(|| Arc::clone(&base.hand_raising)),
            joiners: self
                .joiners
                .map(Arc::new)
                .unwrap_or_else(|| Arc::clone(&base.joiners)),
            current_user_id: base.current_user_id.clone(),
            is_banned: base.is_banned,
            class_mode: base.class_mode,
        };
        Reduction { state, changed }
    }
}
