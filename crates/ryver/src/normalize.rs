//! Normalization pipeline: raw webhook payloads to one canonical shape.
//!
//! Ordered stages, each contributing one concern: kind tagging, user
//! extraction, channel extraction, text extraction, then categorization.
//! A stage whose preconditions are not met skips cleanly; the pipeline
//! hard-fails only when no user or no channel can be derived, and a
//! partially-normalized message is never forwarded.

use thiserror::Error;

use crate::{
    address::{ChannelAddress, ChannelKind},
    event::{CommandPayload, Entity, EntityPayload, EntityType, EventData, EventTopic, RawEvent},
    identity::BotIdentity,
};

/// Classification attached to a normalized message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Slash-command invocation.
    Command,
    /// Message in a direct-user channel.
    DirectMessage,
    /// Message leading with the bot's handle.
    DirectMention,
    /// Message referencing the bot's handle elsewhere.
    Mention,
    /// Chat or comment traffic that does not reference the bot.
    Ambient,
    /// Any other platform event, keyed by its raw type string.
    Event(String),
}

/// The single message shape handed to the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub kind: MessageKind,
    pub user_id: u64,
    pub channel: ChannelAddress,
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("could not obtain a user for the event")]
    MissingUser,
    #[error("could not obtain a channel for the event")]
    MissingChannel,
}

/// Run the full pipeline over one raw event.
pub fn normalize(
    event: &RawEvent,
    identity: &BotIdentity,
) -> Result<NormalizedMessage, NormalizeError> {
    let kind = tag_kind(event);
    let user_id = resolve_user(event).ok_or(NormalizeError::MissingUser)?;
    let channel = resolve_channel(event).ok_or(NormalizeError::MissingChannel)?;
    let text = extract_text(event);

    let mut message = NormalizedMessage {
        kind,
        user_id,
        channel,
        text,
    };
    categorize(&mut message, identity);
    Ok(message)
}

fn tag_kind(event: &RawEvent) -> MessageKind {
    match event {
        RawEvent::Command(_) => MessageKind::Command,
        RawEvent::Entity(entity) => MessageKind::Event(entity.event_type.clone()),
    }
}

fn resolve_user(event: &RawEvent) -> Option<u64> {
    match event {
        RawEvent::Command(cmd) => cmd.user_id.parse().ok(),
        RawEvent::Entity(entity) => Some(entity.user.as_ref()?.id),
    }
}

fn resolve_channel(event: &RawEvent) -> Option<ChannelAddress> {
    match event {
        RawEvent::Command(cmd) => resolve_command_channel(cmd),
        RawEvent::Entity(entity) => resolve_entity_channel(entity),
    }
}

fn resolve_command_channel(cmd: &CommandPayload) -> Option<ChannelAddress> {
    let kind = EntityType::from_tag(&cmd.channel_type)?.channel_kind()?;
    let id = cmd.channel_id.parse().ok()?;
    Some(ChannelAddress::new(kind, id))
}

fn resolve_entity_channel(entity: &EntityPayload) -> Option<ChannelAddress> {
    let (topic, _) = EventTopic::from_event_type(&entity.event_type)?;
    let data = entity.data.as_ref()?;
    match topic {
        EventTopic::Chat => {
            let channel = data.channel.as_ref()?;
            let tag = &channel.metadata.as_ref()?.entity_type;
            let kind = EntityType::from_tag(tag)?.channel_kind()?;
            Some(ChannelAddress::new(kind, channel.id?))
        },
        EventTopic::Post => {
            entity_or_own_id(data).map(|id| ChannelAddress::new(ChannelKind::Post, id))
        },
        EventTopic::Task => {
            entity_or_own_id(data).map(|id| ChannelAddress::new(ChannelKind::Task, id))
        },
        // Create notifications nest the parent inside the comment entity;
        // delete notifications carry it at the data level.
        EventTopic::PostComment => {
            let id = match data.entity.as_ref() {
                Some(comment) => comment.post.as_ref()?.id,
                None => data.post.as_ref()?.id,
            };
            Some(ChannelAddress::new(ChannelKind::Post, id))
        },
        EventTopic::TaskComment => {
            let id = match data.entity.as_ref() {
                Some(comment) => comment.task.as_ref()?.id,
                None => data.task.as_ref()?.id,
            };
            Some(ChannelAddress::new(ChannelKind::Task, id))
        },
    }
}

fn entity_or_own_id(data: &EventData) -> Option<u64> {
    data.entity_id
        .or_else(|| data.entity.as_ref().and_then(|entity| entity.id))
}

fn extract_text(event: &RawEvent) -> String {
    match event {
        RawEvent::Command(cmd) => {
            let arg = cmd.text.as_deref().unwrap_or("");
            format!("{} {arg}", cmd.command).trim().to_string()
        },
        RawEvent::Entity(entity) => entity
            .data
            .as_ref()
            .and_then(|data| data.entity.as_ref())
            .and_then(entity_text)
            .unwrap_or_default(),
    }
}

/// Body field per entity discriminator; unknown or missing discriminators
/// yield no text rather than an error.
fn entity_text(entity: &Entity) -> Option<String> {
    match entity.entity_type()? {
        EntityType::ChatMessage => entity.message.clone(),
        EntityType::Post | EntityType::Task => entity.body.clone(),
        EntityType::PostComment | EntityType::TaskComment => entity.comment.clone(),
        _ => None,
    }
}

/// Only freshly created chat traffic gets reclassified by mention
/// detection; every other event keeps its raw type.
fn wants_categorization(kind: &MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::Event(event_type)
            if event_type == "chat_created"
                || event_type == "postcomment_created"
                || event_type == "taskcomment_created"
    )
}

fn categorize(message: &mut NormalizedMessage, identity: &BotIdentity) {
    if !wants_categorization(&message.kind) {
        return;
    }

    if message.channel.kind == ChannelKind::User {
        message.kind = MessageKind::DirectMessage;
        return;
    }

    // Literal, case-insensitive token matching. A regex built from the
    // handle would miscompute when the handle contains metacharacters.
    let token = format!("@{}", identity.handle);
    if leads_with_token(&message.text, &token) {
        message.kind = MessageKind::DirectMention;
        message.text = strip_leading_token(&message.text, token.len());
    } else if mentions_token(&message.text, &token) {
        message.kind = MessageKind::Mention;
    } else {
        message.kind = MessageKind::Ambient;
    }
}

fn leads_with_token(text: &str, token: &str) -> bool {
    text.len() >= token.len()
        && text.is_char_boundary(token.len())
        && text[..token.len()].eq_ignore_ascii_case(token)
}

/// Drop the leading token plus one separator character.
fn strip_leading_token(text: &str, token_len: usize) -> String {
    let mut chars = text[token_len..].chars();
    chars.next();
    chars.as_str().to_string()
}

/// Token occurrence bounded on the left by start-of-string or a non-word
/// character.
fn mentions_token(text: &str, token: &str) -> bool {
    let haystack = text.to_ascii_lowercase();
    let needle = token.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let at = from + pos;
        let bounded = haystack[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
        if bounded {
            return true;
        }
        // The token starts with '@' (one byte), so at + 1 stays on a char
        // boundary.
        from = at + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    fn bot() -> BotIdentity {
        BotIdentity {
            id: 99,
            handle: "bot".into(),
        }
    }

    fn event(value: serde_json::Value) -> RawEvent {
        serde_json::from_value(value).unwrap()
    }

    fn chat_created(channel_type: &str, channel_id: u64, text: &str) -> RawEvent {
        event(json!({
            "type": "chat_created",
            "user": { "id": 9 },
            "data": {
                "entity": {
                    "__metadata": { "type": "Entity.ChatMessage" },
                    "message": text
                },
                "channel": {
                    "__metadata": { "type": channel_type },
                    "id": channel_id
                }
            }
        }))
    }

    #[test]
    fn normalizes_a_slash_command() {
        let raw = event(json!({
            "command": "/todo",
            "userId": "108",
            "channelId": "55",
            "channelType": "Entity.Forum",
            "text": "add milk"
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::Command);
        assert_eq!(message.user_id, 108);
        assert_eq!(message.channel.to_string(), "F55");
        assert_eq!(message.text, "/todo add milk");
    }

    #[test]
    fn command_without_argument_trims_the_text() {
        let raw = event(json!({
            "command": "/status",
            "userId": "1",
            "channelId": "2",
            "channelType": "Entity.User"
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.text, "/status");
        assert_eq!(message.channel.to_string(), "U2");
    }

    #[test]
    fn direct_mention_strips_the_token() {
        let raw = chat_created("Entity.Workroom", 31, "@bot hello");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::DirectMention);
        assert_eq!(message.text, "hello");
        assert_eq!(message.channel.to_string(), "W31");
    }

    #[test]
    fn mention_detection_ignores_case() {
        let raw = chat_created("Entity.Forum", 5, "@BOT hello");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::DirectMention);
        assert_eq!(message.text, "hello");
    }

    #[test]
    fn embedded_mention_is_classified_as_mention() {
        let raw = chat_created("Entity.Forum", 5, "hey @bot, got a sec?");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::Mention);
        assert_eq!(message.text, "hey @bot, got a sec?");
    }

    #[test]
    fn word_bounded_handle_is_not_a_mention() {
        let raw = chat_created("Entity.Forum", 5, "email me at x@bot.example");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::Ambient);

        let raw = chat_created("Entity.Forum", 5, "the robot walks");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::Ambient);
    }

    #[test]
    fn plain_chat_is_ambient() {
        let raw = chat_created("Entity.Workroom", 31, "nothing to see");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::Ambient);
    }

    #[test]
    fn user_channel_wins_over_mention_text() {
        let raw = chat_created("Entity.User", 9, "@bot hello");
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::DirectMessage);
        assert_eq!(message.text, "@bot hello");
    }

    #[test]
    fn postcomment_created_resolves_the_parent_post() {
        let raw = event(json!({
            "type": "postcomment_created",
            "user": { "id": 4 },
            "data": {
                "entity": {
                    "__metadata": { "type": "Entity.Post.Comment" },
                    "comment": "nice",
                    "post": { "id": 77 }
                }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.channel.to_string(), "P77");
        assert_eq!(message.text, "nice");
        assert_eq!(message.kind, MessageKind::Ambient);
    }

    #[test]
    fn postcomment_deleted_uses_the_flat_shape() {
        let raw = event(json!({
            "type": "postcomment_deleted",
            "user": { "id": 4 },
            "data": {
                "post": { "id": 78 }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.channel.to_string(), "P78");
        assert_eq!(message.kind, MessageKind::Event("postcomment_deleted".into()));
        assert_eq!(message.text, "");
    }

    #[test]
    fn taskcomment_created_resolves_the_parent_task() {
        let raw = event(json!({
            "type": "taskcomment_created",
            "user": { "id": 4 },
            "data": {
                "entity": {
                    "__metadata": { "type": "Entity.Tasks.TaskComment" },
                    "comment": "@bot on it",
                    "task": { "id": 12 }
                }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.channel.to_string(), "T12");
        assert_eq!(message.kind, MessageKind::DirectMention);
        assert_eq!(message.text, "on it");
    }

    #[test]
    fn task_created_prefers_the_entity_id_field() {
        let raw = event(json!({
            "type": "task_created",
            "user": { "id": 4 },
            "data": {
                "entityId": 200,
                "entity": {
                    "__metadata": { "type": "Entity.Tasks.Task" },
                    "id": 201,
                    "body": "ship it"
                }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.channel.to_string(), "T200");
        assert_eq!(message.text, "ship it");
        assert_eq!(message.kind, MessageKind::Event("task_created".into()));
    }

    #[test]
    fn post_created_falls_back_to_the_entity_own_id() {
        let raw = event(json!({
            "type": "post_created",
            "user": { "id": 4 },
            "data": {
                "entity": {
                    "__metadata": { "type": "Entity.Post" },
                    "id": 300,
                    "body": "announcement"
                }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.channel.to_string(), "P300");
        assert_eq!(message.text, "announcement");
    }

    #[test]
    fn missing_user_aborts() {
        let raw = event(json!({
            "type": "chat_created",
            "data": {
                "channel": { "__metadata": { "type": "Entity.Forum" }, "id": 1 }
            }
        }));
        assert_eq!(normalize(&raw, &bot()), Err(NormalizeError::MissingUser));
    }

    #[test]
    fn unknown_event_topic_aborts_on_channel() {
        let raw = event(json!({
            "type": "wiki_created",
            "user": { "id": 4 },
            "data": {}
        }));
        assert_eq!(normalize(&raw, &bot()), Err(NormalizeError::MissingChannel));
    }

    #[test]
    fn unknown_channel_entity_aborts() {
        let raw = chat_created("Entity.Wiki", 1, "hi");
        assert_eq!(normalize(&raw, &bot()), Err(NormalizeError::MissingChannel));
    }

    #[test]
    fn unknown_entity_discriminator_yields_empty_text() {
        let raw = event(json!({
            "type": "post_created",
            "user": { "id": 4 },
            "data": {
                "entity": {
                    "__metadata": { "type": "Entity.Wiki.Page" },
                    "id": 300,
                    "body": "hidden"
                }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.text, "");
    }

    #[test]
    fn non_created_chat_events_keep_their_raw_type() {
        let raw = event(json!({
            "type": "chat_updated",
            "user": { "id": 4 },
            "data": {
                "entity": {
                    "__metadata": { "type": "Entity.ChatMessage" },
                    "message": "@bot edited"
                },
                "channel": { "__metadata": { "type": "Entity.Forum" }, "id": 2 }
            }
        }));
        let message = normalize(&raw, &bot()).unwrap();
        assert_eq!(message.kind, MessageKind::Event("chat_updated".into()));
    }
}
