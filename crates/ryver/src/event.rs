//! Serde model for inbound Ryver webhook payloads.
//!
//! Ryver delivers two payload families: a flat slash-command form and an
//! entity-change notification carrying a `type` string plus nested entity
//! data. Both the event-type prefix and the `__metadata.type` entity
//! discriminator are open unions that grow over platform versions, so they
//! are parsed into explicit enums with an "unknown tag → `None`, caller
//! decides" fallback.

use serde::Deserialize;

use crate::address::ChannelKind;

/// Entity discriminator carried in `__metadata.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    ChatMessage,
    Post,
    Task,
    PostComment,
    TaskComment,
    Forum,
    Workroom,
    User,
}

impl EntityType {
    /// Parse a platform discriminator tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "Entity.ChatMessage" => Self::ChatMessage,
            "Entity.Post" => Self::Post,
            "Entity.Tasks.Task" => Self::Task,
            "Entity.Post.Comment" => Self::PostComment,
            "Entity.Tasks.TaskComment" => Self::TaskComment,
            "Entity.Forum" => Self::Forum,
            "Entity.Workroom" => Self::Workroom,
            "Entity.User" => Self::User,
            _ => return None,
        })
    }

    /// The channel kind reachable through this entity, for the three
    /// chat-capable entity types. Everything else cannot classify a channel.
    pub fn channel_kind(self) -> Option<ChannelKind> {
        match self {
            Self::Forum => Some(ChannelKind::Forum),
            Self::Workroom => Some(ChannelKind::Workroom),
            Self::User => Some(ChannelKind::User),
            _ => None,
        }
    }
}

/// Event family carried in the raw `type` string (`"<topic>_<action>"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTopic {
    Chat,
    Post,
    PostComment,
    Task,
    TaskComment,
}

impl EventTopic {
    /// Split a raw event type into its topic and action, e.g.
    /// `"postcomment_created"` → `(PostComment, "created")`.
    pub fn from_event_type(event_type: &str) -> Option<(Self, &str)> {
        let (topic, action) = event_type.split_once('_')?;
        let topic = match topic {
            "chat" => Self::Chat,
            "post" => Self::Post,
            "postcomment" => Self::PostComment,
            "task" => Self::Task,
            "taskcomment" => Self::TaskComment,
            _ => return None,
        };
        Some((topic, action))
    }
}

/// One inbound webhook payload. Received once per request, consumed by the
/// normalization pipeline, never retained.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEvent {
    Command(CommandPayload),
    Entity(EntityPayload),
}

/// Flat slash-command payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandPayload {
    pub command: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "channelType")]
    pub channel_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Entity-change notification.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub user: Option<AccountRef>,
    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountRef {
    pub id: u64,
}

/// Nested event data. Create notifications carry a full `entity`; delete
/// notifications carry only parent references at this level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventData {
    #[serde(rename = "entityId")]
    pub entity_id: Option<u64>,
    pub entity: Option<Entity>,
    pub channel: Option<ChannelRef>,
    pub post: Option<EntityRef>,
    pub task: Option<EntityRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Entity {
    #[serde(rename = "__metadata")]
    pub metadata: Option<Metadata>,
    pub id: Option<u64>,
    pub message: Option<String>,
    pub body: Option<String>,
    pub comment: Option<String>,
    pub post: Option<EntityRef>,
    pub task: Option<EntityRef>,
}

impl Entity {
    pub fn entity_type(&self) -> Option<EntityType> {
        EntityType::from_tag(&self.metadata.as_ref()?.entity_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    #[serde(rename = "type")]
    pub entity_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: u64,
}

/// Chat channel/team entity attached to `chat_*` events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelRef {
    #[serde(rename = "__metadata")]
    pub metadata: Option<Metadata>,
    pub id: Option<u64>,
}
