//! Participant profile lookup.
//!
//! Channel membership only carries user ids. Names, avatars and media ids
//! come from an external service behind [`ProfileResolver`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roomsync_types::{MediaId, Profile, RoomId, UserId};
use thiserror::Error;

/// Profile lookup errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The service knows nothing about this user.
    #[error("no profile for {0}")]
    Unknown(UserId),

    /// The lookup itself failed.
    #[error("profile lookup failed: {0}")]
    Failed(String),
}

/// Resolves display profiles for room members.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Resolve every id in `users`.
    ///
    /// Ids missing from the returned map are treated as unknown.
    async fn resolve(
        &self,
        room: &RoomId,
        users: &[UserId],
    ) -> Result<HashMap<UserId, Profile>, ResolveError>;
}

/// Fixed profile table.
///
/// Useful for tests and the simulator. Supports forced failures like the
/// channel test double.
#[derive(Debug, Default, Clone)]
pub struct StaticProfiles {
    inner: Arc<Mutex<StaticInner>>,
}

#[derive(Debug, Default)]
struct StaticInner {
    profiles: HashMap<UserId, Profile>,
    lookups: usize,
    fail_next: Option<String>,
}

impl StaticProfiles {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile.
    pub fn insert(&self, id: impl Into<UserId>, profile: Profile) {
        let mut inner = self.inner.lock().unwrap();
        inner.profiles.insert(id.into(), profile);
    }

    /// Register a user by display name, deriving the avatar and media id.
    pub fn with_user(self, id: &str, name: &str) -> Self {
        let media_id = {
            let inner = self.inner.lock().unwrap();
            MediaId::new(inner.profiles.len() as u32 + 1)
        };
        self.insert(
            id,
            Profile {
                media_id,
                avatar: format!("https://avatars.roomsync.dev/{id}.png"),
                name: name.to_string(),
            },
        );
        self
    }

    /// Number of resolve() calls so far.
    pub fn lookups(&self) -> usize {
        self.inner.lock().unwrap().lookups
    }

    /// Cause the next resolve() to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        self.inner.lock().unwrap().fail_next = Some(error.to_string());
    }
}

#[async_trait]
impl ProfileResolver for StaticProfiles {
    async fn resolve(
        &self,
        _room: &RoomId,
        users: &[UserId],
    ) -> Result<HashMap<UserId, Profile>, ResolveError> {
        let mut inner = self.inner.lock().unwrap();
        inner.lookups += 1;

        if let Some(error) = inner.fail_next.take() {
            return Err(ResolveError::Failed(error));
        }

        Ok(users
            .iter()
            .filter_map(|id| {
                inner
                    .profiles
                    .get(id)
                    .map(|profile| (id.clone(), profile.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_known_users_only() {
        let profiles = StaticProfiles::new()
            .with_user("teacher", "Ms. Frizzle")
            .with_user("alice", "Alice");

        let room = RoomId::from("r");
        let found = profiles
            .resolve(&room, &[UserId::from("alice"), UserId::from("ghost")])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        let alice = &found[&UserId::from("alice")];
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.media_id, MediaId::new(2));
        assert_eq!(profiles.lookups(), 1);
    }

    #[tokio::test]
    async fn forced_failure_fires_once() {
        let profiles = StaticProfiles::new().with_user("a", "A");
        profiles.fail_next("service unavailable");

        let room = RoomId::from("r");
        let ids = [UserId::from("a")];
        assert!(matches!(
            profiles.resolve(&room, &ids).await,
            Err(ResolveError::Failed(_))
        ));
        assert!(profiles.resolve(&room, &ids).await.is_ok());
    }
}
