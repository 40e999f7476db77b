//! Reply helpers: cards, mentions and help text.

use serde_json::Value;

use webex_bot_core::{
    ApiResult, Attachment, Hook, Membership, Message, MessagingApi, NewMessage, Person,
};

/// Text sent alongside a card for clients that cannot render it.
pub const CARD_FALLBACK_TEXT: &str = "fallback";

/// First line of the help message.
pub const HELP_HEADER: &str = "Here are some commands I understand:";

/// Something that can be mentioned in a message.
pub trait Mentionable {
    /// Email address or person ID to mention.
    fn mention_target(&self) -> &str;

    /// Name shown for the mention.
    fn mention_name(&self) -> &str;
}

impl Mentionable for Person {
    fn mention_target(&self) -> &str {
        self.emails.first().map(String::as_str).unwrap_or(self.id.as_str())
    }

    fn mention_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or_default()
    }
}

impl Mentionable for Membership {
    fn mention_target(&self) -> &str {
        self.person_email
            .as_deref()
            .or(self.person_id.as_deref())
            .unwrap_or(self.id.as_str())
    }

    fn mention_name(&self) -> &str {
        self.person_display_name.as_deref().unwrap_or_default()
    }
}

/// Markdown mention of a person or membership.
///
/// Targets containing `@` are mentioned by email, others by person ID.
pub fn mention(who: &impl Mentionable) -> String {
    let target = who.mention_target();
    let kind = if target.contains('@') {
        "personEmail"
    } else {
        "personId"
    };
    format!("<@{kind}:{target}|{}>", who.mention_name())
}

/// Markdown mention by person ID.
pub fn mention_id(person_id: &str, display_name: &str) -> String {
    format!("<@personId:{person_id}|{display_name}>")
}

/// Help text listing every hook's name and description.
pub fn help_text(hooks: &[Hook]) -> String {
    let mut text = String::from(HELP_HEADER);
    for hook in hooks {
        text.push_str(&format!("\n**{}**\n\t{}", hook.name(), hook.description()));
    }
    text
}

/// Posts an adaptive card to a room.
pub async fn send_card(api: &dyn MessagingApi, room_id: &str, card: Value) -> ApiResult<Message> {
    let message = NewMessage::to_room(room_id)
        .text(CARD_FALLBACK_TEXT)
        .attachment(Attachment::adaptive_card(card));
    api.create_message(&message).await
}

/// Replies to `source` with `help`, as both text and markdown.
pub async fn send_help(api: &dyn MessagingApi, source: &Message, help: &str) -> ApiResult<Message> {
    let room_id = source.room_id.as_deref().unwrap_or_default();
    let message = NewMessage::to_room(room_id).text(help).markdown(help);
    api.create_message(&message).await
}
