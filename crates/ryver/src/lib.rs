//! Ryver connector core.
//!
//! Translates inbound Ryver webhook payloads (chat messages, posts, tasks,
//! comments, slash commands) into one canonical message shape, and routes
//! canonical replies back onto the matching Ryver REST operation. The host
//! bot runtime plugs in through [`handler::MessageHandler`]; HTTP serving
//! lives in the gateway crate.

pub mod address;
pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod identity;
pub mod normalize;
pub mod outbound;
pub mod signature;

pub use {
    address::{ChannelAddress, ChannelKind},
    api::RyverApi,
    config::RyverConfig,
    error::{Error, Result},
    event::RawEvent,
    handler::{MessageHandler, ReplySink},
    identity::{BotIdentity, IdentityCache},
    normalize::{MessageKind, NormalizedMessage, normalize},
    outbound::{OutboundMessage, RyverOutbound},
};
