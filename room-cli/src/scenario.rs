//! Scenario files for `roomsync simulate`.
//!
//! ```toml
//! [room]
//! id = "physics-101"
//!
//! [[participants]]
//! id = "teacher"
//! name = "Ms. Frizzle"
//! role = "creator"
//!
//! [[participants]]
//! id = "alice"
//! name = "Alice"
//! role = "joiner"
//!
//! [[steps]]
//! action = "raise-hand"
//! actor = "alice"
//!
//! [[steps]]
//! action = "accept-raise-hand"
//! actor = "teacher"
//! user = "alice"
//! ```

use anyhow::{Context, Result};
use roomsync_client::Role;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// A scripted lesson.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Room settings.
    pub room: RoomSection,
    /// Everyone who joins, in join order.
    pub participants: Vec<Participant>,
    /// Actions to replay after everyone joined.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// `[room]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomSection {
    /// Room (channel) name.
    pub id: String,
    /// History page width in days.
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,
}

fn default_history_window_days() -> u32 {
    365
}

/// One `[[participants]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role in the room.
    pub role: Role,
}

/// One `[[steps]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Toggle the actor's raised hand.
    RaiseHand { actor: String },
    /// Put a participant with a raised hand on stage.
    AcceptRaiseHand { actor: String, user: String },
    /// Put a participant on or off stage.
    Speak {
        actor: String,
        user: String,
        speak: bool,
    },
    /// Set a participant's devices.
    Devices {
        actor: String,
        user: String,
        camera: bool,
        mic: bool,
    },
    /// Lower every raised hand.
    CancelAllHands { actor: String },
    /// Mute or unmute chat.
    ToggleBan { actor: String },
    /// Switch lecture / interaction.
    ToggleClassMode { actor: String },
    /// Send a chat message.
    Message { actor: String, text: String },
    /// Post a notice.
    Notice {
        actor: String,
        text: String,
        #[serde(default)]
        keep: bool,
    },
    /// Load one older history page.
    LoadHistory { actor: String },
    /// Leave the room.
    Leave { actor: String },
}

impl Step {
    /// Participant performing the step.
    pub fn actor(&self) -> &str {
        match self {
            Step::RaiseHand { actor }
            | Step::AcceptRaiseHand { actor, .. }
            | Step::Speak { actor, .. }
            | Step::Devices { actor, .. }
            | Step::CancelAllHands { actor }
            | Step::ToggleBan { actor }
            | Step::ToggleClassMode { actor }
            | Step::Message { actor, .. }
            | Step::Notice { actor, .. }
            | Step::LoadHistory { actor }
            | Step::Leave { actor } => actor,
        }
    }
}

impl Scenario {
    /// Load a scenario from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Parse a scenario from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for participant in &self.participants {
            if !ids.insert(participant.id.as_str()) {
                anyhow::bail!("participant {} listed twice", participant.id);
            }
        }
        for step in &self.steps {
            if !ids.contains(step.actor()) {
                anyhow::bail!("step actor {} is not a participant", step.actor());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LESSON: &str = r#"
        [room]
        id = "physics-101"

        [[participants]]
        id = "teacher"
        name = "Ms. Frizzle"
        role = "creator"

        [[participants]]
        id = "alice"
        name = "Alice"
        role = "joiner"

        [[steps]]
        action = "raise-hand"
        actor = "alice"

        [[steps]]
        action = "notice"
        actor = "teacher"
        text = "homework"
        keep = true

        [[steps]]
        action = "devices"
        actor = "alice"
        user = "alice"
        camera = true
        mic = false
    "#;

    #[test]
    fn parses_steps() {
        let scenario = Scenario::from_toml_str(LESSON).unwrap();
        assert_eq!(scenario.room.history_window_days, 365);
        assert_eq!(scenario.participants[0].role, Role::Creator);
        assert_eq!(
            scenario.steps,
            vec![
                Step::RaiseHand {
                    actor: "alice".into()
                },
                Step::Notice {
                    actor: "teacher".into(),
                    text: "homework".into(),
                    keep: true
                },
                Step::Devices {
                    actor: "alice".into(),
                    user: "alice".into(),
                    camera: true,
                    mic: false
                },
            ]
        );
    }

    #[test]
    fn rejects_unknown_actor() {
        let content = LESSON.replace("actor = \"alice\"", "actor = \"mallory\"");
        let err = Scenario::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("mallory"));
    }

    #[test]
    fn rejects_duplicate_participant() {
        let content = LESSON.replacen(
            "[[steps]]",
            "[[participants]]\nid = \"alice\"\nname = \"Alice 2\"\nrole = \"joiner\"\n\n[[steps]]",
            1,
        );
        assert!(Scenario::from_toml_str(&content).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LESSON.as_bytes()).unwrap();
        let scenario = Scenario::from_file(file.path()).unwrap();
        assert_eq!(scenario.participants.len(), 2);
    }
}
