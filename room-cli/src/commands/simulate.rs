//! Replay a scripted lesson across in-process clients.

use anyhow::{Context, Result};
use roomsync_client::{
    ClientError, MemoryChannel, MemoryHub, RoomClient, RoomConfig, RoomSnapshot, StaticProfiles,
};
use roomsync_types::{MessageBody, SpeakConfig, User};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::scenario::{Scenario, Step};

type Client = RoomClient<MemoryChannel, StaticProfiles>;

/// Run the simulate command.
pub async fn run(path: &Path) -> Result<()> {
    let scenario = Scenario::from_file(path)?;
    let views = simulate(&scenario).await?;

    for (id, snapshot) in &views {
        println!("{}", render(id, snapshot));
    }
    Ok(())
}

/// Join everyone, replay every step, and return each participant's view.
pub async fn simulate(scenario: &Scenario) -> Result<Vec<(String, RoomSnapshot)>> {
    let hub = MemoryHub::new();
    let profiles = scenario
        .participants
        .iter()
        .fold(StaticProfiles::new(), |profiles, p| {
            profiles.with_user(&p.id, &p.name)
        });

    let mut clients: Vec<(String, Client)> = Vec::with_capacity(scenario.participants.len());
    for participant in &scenario.participants {
        let config = RoomConfig::new(
            participant.id.as_str(),
            scenario.room.id.as_str(),
            participant.role,
        )
        .with_history_window_days(scenario.room.history_window_days);
        let client = RoomClient::new(config, hub.channel(), profiles.clone());
        client
            .join()
            .await
            .with_context(|| format!("{} failed to join", participant.id))?;
        clients.push((participant.id.clone(), client));
        settle(&clients).await?;
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        let (_, client) = clients
            .iter()
            .find(|(id, _)| id == step.actor())
            .with_context(|| format!("unknown actor {}", step.actor()))?;
        tracing::info!("Step {}: {:?}", index + 1, step);
        perform(client, step)
            .await
            .with_context(|| format!("step {} failed", index + 1))?;
        settle(&clients).await?;
    }

    Ok(clients
        .iter()
        .map(|(id, client)| (id.clone(), client.snapshot()))
        .collect())
}

/// Let every client drain its inbox.
async fn settle(clients: &[(String, Client)]) -> Result<()> {
    for (id, client) in clients {
        let handled = client
            .run()
            .await
            .with_context(|| format!("{id} failed to receive"))?;
        tracing::debug!("{} handled {} events", id, handled);
    }
    Ok(())
}

async fn perform(client: &Client, step: &Step) -> Result<(), ClientError> {
    match step {
        Step::RaiseHand { .. } => client.toggle_hand_raising().await,
        Step::AcceptRaiseHand { user, .. } => client.accept_raise_hand(user.as_str()).await,
        Step::Speak { user, speak, .. } => {
            client
                .speak(vec![SpeakConfig::new(user.as_str(), *speak)])
                .await
        }
        Step::Devices {
            user, camera, mic, ..
        } => {
            client
                .update_device_state(user.as_str(), *camera, *mic)
                .await
        }
        Step::CancelAllHands { .. } => client.cancel_all_hand_raising().await,
        Step::ToggleBan { .. } => client.toggle_ban().await,
        Step::ToggleClassMode { .. } => client.toggle_class_mode().await,
        Step::Message { text, .. } => client.send_message(text).await,
        Step::Notice { text, keep, .. } => client.send_notice(text, *keep).await,
        Step::LoadHistory { .. } => client.load_older_history().await.map(|_| ()),
        Step::Leave { .. } => {
            client.leave().await;
            Ok(())
        }
    }
}

fn render_group(users: &[Arc<User>]) -> String {
    if users.is_empty() {
        return "-".to_string();
    }
    users
        .iter()
        .map(|user| {
            let mut devices = Vec::new();
            if user.camera {
                devices.push("cam");
            }
            if user.mic {
                devices.push("mic");
            }
            format!("{} [{}]", user.name, devices.join(" "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format one participant's view of the room.
pub fn render(id: &str, snapshot: &RoomSnapshot) -> String {
    let room = &snapshot.room;
    let mut out = String::new();

    let _ = writeln!(out, "=== {} ({:?}) ===", id, snapshot.phase);
    let _ = writeln!(
        out,
        "  Class mode:  {:?}, chat {}",
        room.class_mode(),
        if room.is_banned() { "muted" } else { "open" }
    );
    let creator = room
        .creator()
        .map(|user| user.name.clone())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "  Creator:     {}", creator);
    let _ = writeln!(out, "  Speaking:    {}", render_group(room.speaking()));
    let _ = writeln!(out, "  Hand raised: {}", render_group(room.hand_raising()));
    let _ = writeln!(out, "  Joiners:     {}", render_group(room.joiners()));
    let _ = writeln!(out, "  Messages:    {}", snapshot.messages.len());
    for message in snapshot.messages.iter() {
        let line = match &message.body {
            MessageBody::Chat(text) => format!("{}: {}", message.sender_id, text),
            MessageBody::Notice(text) => format!("[notice] {}: {}", message.sender_id, text),
            MessageBody::Ban(true) => "[chat muted]".to_string(),
            MessageBody::Ban(false) => "[chat unmuted]".to_string(),
        };
        let _ = writeln!(out, "    {}", line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_client::SessionPhase;
    use roomsync_types::ClassMode;

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

        [[participants]]
        id = "bob"
        name = "Bob"
        role = "joiner"

        [[steps]]
        action = "toggle-class-mode"
        actor = "teacher"

        [[steps]]
        action = "raise-hand"
        actor = "alice"

        [[steps]]
        action = "accept-raise-hand"
        actor = "teacher"
        user = "alice"

        [[steps]]
        action = "toggle-ban"
        actor = "teacher"

        [[steps]]
        action = "message"
        actor = "bob"
        text = "this is dropped"

        [[steps]]
        action = "leave"
        actor = "bob"
    "#;

    #[tokio::test]
    async fn lesson_converges() {
        let scenario = Scenario::from_toml_str(LESSON).unwrap();
        let views = simulate(&scenario).await.unwrap();

        let (_, teacher) = &views[0];
        let (_, alice) = &views[1];
        let (_, bob) = &views[2];

        for view in [teacher, alice] {
            assert_eq!(view.room.class_mode(), ClassMode::Interaction);
            assert!(view.room.is_banned());
            assert_eq!(view.room.speaking().len(), 1);
            assert_eq!(view.room.speaking()[0].id.as_str(), "alice");
            assert_eq!(view.room.joiners().len(), 0);
            assert!(view
                .messages
                .iter()
                .all(|m| m.body == MessageBody::Ban(true)));
        }
        assert_eq!(bob.phase, SessionPhase::TornDown);
    }

    #[tokio::test]
    async fn render_lists_groups_and_messages() {
        let scenario = Scenario::from_toml_str(LESSON).unwrap();
        let views = simulate(&scenario).await.unwrap();
        let (id, teacher) = &views[0];

        let text = render(id, teacher);
        assert!(text.contains("=== teacher (Synced) ==="));
        assert!(text.contains("Speaking:    Alice [mic]"));
        assert!(text.contains("[chat muted]"));
    }
}
