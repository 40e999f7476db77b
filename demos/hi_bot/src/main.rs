//! Hi Bot Example
//!
//! Answers "hi" or "hello" with a greeting naming the sender.
//!
//! # Configuration
//!
//! `webexbot.toml` in the working directory:
//!
//! ```toml
//! [bot]
//! name = "hibot"
//! access_token = "..."
//!
//! [tunnel]
//! public_url = "https://abc123.ngrok.io"
//! ```
//!
//! Any key can also come from the environment, e.g.
//! `WEBEX_BOT_BOT__ACCESS_TOKEN`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package hi-bot
//! ```

use anyhow::Result;
use tracing::info;
use webex_bot::prelude::*;

/// Greets the sender by display name.
async fn say_hi(message: Message, api: BoxedApi) -> Result<Message, ApiError> {
    let person_id = message.person_id.as_deref().unwrap_or_default();
    let person = api.get_person(person_id).await?;
    info!(person = %person.id, "Saying hi");

    let room_id = message.room_id.clone().unwrap_or_default();
    let text = format!("Hi {}", person.display_name.as_deref().unwrap_or_default());
    api.create_message(&NewMessage::to_room(room_id).text(text)).await
}

/// Welcomes people added to a room the bot is in.
async fn welcome(Data(membership): Data, api: BoxedApi) -> Result<(), ApiError> {
    let Some(room_id) = membership.get("roomId").and_then(|v| v.as_str()) else {
        return Ok(());
    };
    let name = membership
        .get("personDisplayName")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let person_id = membership
        .get("personId")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let text = format!("Welcome {}! Say hi to me.", mention_id(person_id, name));
    api.create_message(&NewMessage::to_room(room_id).markdown(text)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut bot = WebexBot::builder().build()?;

    bot.hears("hi|hello", say_hi)?;
    bot.on_event("memberships", "created", welcome);
    bot.hears_help("help", "List the commands I understand")?;

    bot.run().await?;

    Ok(())
}
