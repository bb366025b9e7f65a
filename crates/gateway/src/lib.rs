//! HTTP gateway for the Ryver connector.
//!
//! Exposes the webhook endpoint, authenticates inbound deliveries, runs the
//! normalization pipeline, and hands canonical messages to the configured
//! [`castor_ryver::MessageHandler`].

pub mod config;
pub mod server;
