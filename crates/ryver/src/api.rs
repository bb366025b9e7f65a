//! Minimal client for the Ryver OData REST API.
//!
//! Covers exactly the operations the connector dispatches to: the startup
//! identity fetch and the five send operations. Success is status
//! 200/201/204; anything else surfaces as a single error to the caller.
//! Timeouts and retries belong to the transport, not this layer.

use {
    reqwest::{Client, Method, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::json,
    tracing::debug,
};

use crate::error::{Error, Result};

const ACCEPT_VERSION: &str = "2018.09.01";
const USER_AGENT: &str = concat!("castor/", env!("CARGO_PKG_VERSION"));

/// Ryver REST API client.
pub struct RyverApi {
    http: Client,
    api_url: String,
    token: Secret<String>,
}

/// Wrapper shape for single-resource API responses.
#[derive(Debug, Deserialize)]
struct OperationResponse<T> {
    d: T,
}

/// The authenticated user returned by `User.GetCurrent()`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub username: String,
    #[serde(default, rename = "emailAddress")]
    pub email_address: Option<String>,
}

impl RyverApi {
    pub fn new(api_root: &str, token: Secret<String>) -> Self {
        let api_url = format!("{}/api/1/odata.svc/", api_root.trim_end_matches('/'));
        Self {
            http: Client::new(),
            api_url,
            token,
        }
    }

    /// Fetch the bot's own identity. A response without the expected
    /// `{ d: { id, username } }` shape is a malformed-response error.
    pub async fn current_user(&self) -> Result<ApiUser> {
        let body = self.send(Method::GET, "User.GetCurrent()", None).await?;
        let parsed: OperationResponse<ApiUser> =
            serde_json::from_slice(&body).map_err(|_| Error::MalformedIdentityResponse)?;
        Ok(parsed.d)
    }

    pub async fn post_forum_chat_message(
        &self,
        text: &str,
        forum_id: u64,
        ephemeral_user_id: Option<u64>,
    ) -> Result<()> {
        self.post(
            &format!("forums({forum_id})/Chat.PostMessage()"),
            json!({ "body": text, "ephemeralUserId": ephemeral_user_id }),
        )
        .await
    }

    pub async fn post_workroom_chat_message(
        &self,
        text: &str,
        workroom_id: u64,
        ephemeral_user_id: Option<u64>,
    ) -> Result<()> {
        self.post(
            &format!("workrooms({workroom_id})/Chat.PostMessage()"),
            json!({ "body": text, "ephemeralUserId": ephemeral_user_id }),
        )
        .await
    }

    /// Direct chat: an ephemeral send targets the recipient themselves.
    pub async fn post_direct_chat_message(
        &self,
        text: &str,
        user_id: u64,
        ephemeral: bool,
    ) -> Result<()> {
        self.post(
            &format!("users({user_id})/Chat.PostMessage()"),
            json!({ "body": text, "ephemeralUserId": ephemeral.then_some(user_id) }),
        )
        .await
    }

    pub async fn post_post_comment(&self, text: &str, post_id: u64) -> Result<()> {
        self.post(
            "postComments",
            json!({ "comment": text, "post": { "id": post_id } }),
        )
        .await
    }

    pub async fn post_task_comment(&self, text: &str, task_id: u64) -> Result<()> {
        self.post(
            "taskComments",
            json!({ "comment": text, "task": { "id": task_id } }),
        )
        .await
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<()> {
        self.send(Method::POST, path, Some(body)).await.map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>> {
        debug!(%method, path, "ryver api call");
        let mut request = self
            .http
            .request(method, format!("{}{path}", self.api_url))
            .bearer_auth(self.token.expose_secret())
            .header("Accept-Version", ACCEPT_VERSION)
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                Ok(response.bytes().await?.to_vec())
            },
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::RemoteApi { status, body })
            },
        }
    }
}
