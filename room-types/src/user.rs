//! Participant records.

use serde::{Deserialize, Serialize};

use crate::{MediaId, UserId};

/// Display profile resolved for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Media transport uid.
    pub media_id: MediaId,
    /// Avatar image URL.
    pub avatar: String,
    /// Display name.
    pub name: String,
}

/// A room participant as seen by the local client.
///
/// `id` never changes for the lifetime of the record; every other field is
/// only rewritten by the state reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Participant identifier.
    pub id: UserId,
    /// Media transport uid.
    pub media_id: MediaId,
    /// Avatar image URL.
    pub avatar: String,
    /// Display name.
    pub name: String,
    /// Camera enabled.
    pub camera: bool,
    /// Microphone enabled.
    pub mic: bool,
    /// Currently on stage.
    pub is_speaking: bool,
    /// Hand raised and waiting for the creator.
    pub is_hand_raised: bool,
}

impl User {
    /// Build a freshly joined participant from its resolved profile.
    ///
    /// Remote participants start with camera and mic on; the local user
    /// starts with the camera off.
    pub fn from_profile(id: UserId, profile: Profile, current_user: &UserId) -> Self {
        let camera = &id != current_user;
        Self {
            id,
            media_id: profile.media_id,
            avatar: profile.avatar,
            name: profile.name,
            camera,
            mic: true,
            is_speaking: false,
            is_hand_raised: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Profile {
        Profile {
            media_id: MediaId::new(7),
            avatar: format!("https://avatars.example/{name}.png"),
            name: name.to_string(),
        }
    }

    #[test]
    fn remote_user_starts_with_camera_on() {
        let me = UserId::from("me");
        let user = User::from_profile(UserId::from("other"), profile("other"), &me);
        assert!(user.camera);
        assert!(user.mic);
        assert!(!user.is_speaking);
        assert!(!user.is_hand_raised);
    }

    #[test]
    fn local_user_starts_with_camera_off() {
        let me = UserId::from("me");
        let user = User::from_profile(me.clone(), profile("me"), &me);
        assert!(!user.camera);
        assert!(user.mic);
        assert_eq!(user.media_id, MediaId::new(7));
    }
}
