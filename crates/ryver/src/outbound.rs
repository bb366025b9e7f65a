//! Routing of canonical outbound messages onto the REST API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    address::{ChannelAddress, ChannelKind},
    api::RyverApi,
    error::{Error, Result},
};

/// A reply produced by the host runtime, addressed by serialized channel.
///
/// Also the wire shape of the deferred slash-command HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    pub channel: String,
    #[serde(rename = "ephemeralUserId")]
    pub ephemeral_user_id: Option<u64>,
}

/// Maps an outbound message to the REST operation for its channel kind.
#[derive(Clone)]
pub struct RyverOutbound {
    api: Arc<RyverApi>,
}

impl RyverOutbound {
    pub fn new(api: Arc<RyverApi>) -> Self {
        Self { api }
    }

    /// Dispatch one message.
    ///
    /// The channel string comes from arbitrary upstream callers and is
    /// decoded defensively; when it does not decode, the error is reported
    /// synchronously and no network request is issued. The result may be
    /// discarded for fire-and-forget sends.
    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let Some(address) = ChannelAddress::parse(&message.channel) else {
            return Err(Error::InvalidChannelFormat {
                address: message.channel.clone(),
            });
        };

        match address.kind {
            ChannelKind::Post => self.api.post_post_comment(&message.text, address.id).await,
            ChannelKind::Task => self.api.post_task_comment(&message.text, address.id).await,
            ChannelKind::Forum => {
                self.api
                    .post_forum_chat_message(&message.text, address.id, message.ephemeral_user_id)
                    .await
            },
            ChannelKind::Workroom => {
                self.api
                    .post_workroom_chat_message(
                        &message.text,
                        address.id,
                        message.ephemeral_user_id,
                    )
                    .await
            },
            ChannelKind::User => {
                self.api
                    .post_direct_chat_message(
                        &message.text,
                        address.id,
                        message.ephemeral_user_id.is_some(),
                    )
                    .await
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use {mockito::Matcher, secrecy::Secret, serde_json::json};

    use super::*;

    fn outbound(server: &mockito::Server) -> RyverOutbound {
        RyverOutbound::new(Arc::new(RyverApi::new(
            &server.url(),
            Secret::new("token".into()),
        )))
    }

    fn message(channel: &str, ephemeral_user_id: Option<u64>) -> OutboundMessage {
        OutboundMessage {
            text: "hello".into(),
            channel: channel.into(),
            ephemeral_user_id,
        }
    }

    #[tokio::test]
    async fn routes_post_channels_to_post_comments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/1/odata.svc/postComments")
            .match_body(Matcher::Json(
                json!({ "comment": "hello", "post": { "id": 77 } }),
            ))
            .with_status(201)
            .create_async()
            .await;

        outbound(&server).send(&message("P77", None)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn routes_task_channels_to_task_comments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/1/odata.svc/taskComments")
            .match_body(Matcher::Json(
                json!({ "comment": "hello", "task": { "id": 12 } }),
            ))
            .with_status(201)
            .create_async()
            .await;

        outbound(&server).send(&message("T12", None)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn routes_workroom_channels_with_the_ephemeral_target() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/1/odata.svc/workrooms(31)/Chat.PostMessage()")
            .match_body(Matcher::Json(
                json!({ "body": "hello", "ephemeralUserId": 9 }),
            ))
            .with_status(200)
            .create_async()
            .await;

        outbound(&server)
            .send(&message("W31", Some(9)))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn direct_chat_derives_the_ephemeral_flag() {
        let mut server = mockito::Server::new_async().await;
        let ephemeral = server
            .mock("POST", "/api/1/odata.svc/users(42)/Chat.PostMessage()")
            .match_body(Matcher::Json(
                json!({ "body": "hello", "ephemeralUserId": 42 }),
            ))
            .with_status(200)
            .create_async()
            .await;

        outbound(&server)
            .send(&message("U42", Some(9)))
            .await
            .unwrap();
        ephemeral.assert_async().await;

        let plain = server
            .mock("POST", "/api/1/odata.svc/users(42)/Chat.PostMessage()")
            .match_body(Matcher::Json(
                json!({ "body": "hello", "ephemeralUserId": null }),
            ))
            .with_status(200)
            .create_async()
            .await;

        outbound(&server).send(&message("U42", None)).await.unwrap();
        plain.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_channel_issues_no_call() {
        let mut server = mockito::Server::new_async().await;
        let nothing = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = outbound(&server)
            .send(&message("Xabc", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidChannelFormat { ref address } if address == "Xabc"));
        nothing.assert_async().await;
    }
}
