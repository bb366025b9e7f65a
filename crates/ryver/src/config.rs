use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for one Ryver bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RyverConfig {
    /// Base URL of the Ryver instance (e.g. `https://acme.ryver.com`).
    pub api_root: String,

    /// Bot API token used as the bearer credential for REST calls.
    #[serde(serialize_with = "serialize_secret")]
    pub bot_token: Secret<String>,

    /// Shared secret for webhook signature verification. Unset disables
    /// verification (reduced-security mode).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_option_secret"
    )]
    pub app_secret: Option<Secret<String>>,

    /// Let messages sent by the bot itself loop back into the pipeline
    /// instead of being dropped.
    pub allow_bot_originated_messages: bool,
}

impl std::fmt::Debug for RyverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RyverConfig")
            .field("api_root", &self.api_root)
            .field("bot_token", &"[REDACTED]")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "allow_bot_originated_messages",
                &self.allow_bot_originated_messages,
            )
            .finish()
    }
}

impl Default for RyverConfig {
    fn default() -> Self {
        Self {
            api_root: String::new(),
            bot_token: Secret::new(String::new()),
            app_secret: None,
            allow_bot_originated_messages: false,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let config = RyverConfig {
            api_root: "https://acme.ryver.com".into(),
            bot_token: Secret::new("very-secret".into()),
            app_secret: Some(Secret::new("also-secret".into())),
            allow_bot_originated_messages: false,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("also-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: RyverConfig =
            serde_json::from_value(serde_json::json!({ "api_root": "https://acme.ryver.com" }))
                .unwrap();
        assert!(config.app_secret.is_none());
        assert!(!config.allow_bot_originated_messages);
    }
}
