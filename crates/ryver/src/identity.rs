//! The bot's own platform identity.

use std::sync::OnceLock;

use tracing::{error, info};

use crate::api::RyverApi;

/// Numeric id and handle of the bot account, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: u64,
    pub handle: String,
}

/// Process-wide holder for [`BotIdentity`].
///
/// Populated at most once by [`IdentityCache::initialize`] during startup
/// and read-only afterwards, so no lock is needed. Requests that arrive
/// while the cache is unset are rejected upstream instead of running with
/// an undefined identity.
#[derive(Debug, Default)]
pub struct IdentityCache {
    cell: OnceLock<BotIdentity>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the startup identity fetch. A failed or malformed fetch is
    /// logged and leaves the cache unset; the process keeps running.
    pub async fn initialize(&self, api: &RyverApi) {
        match api.current_user().await {
            Ok(user) => {
                let identity = BotIdentity {
                    id: user.id,
                    handle: user.username,
                };
                info!(id = identity.id, handle = %identity.handle, "bot identity received");
                self.set(identity);
            },
            Err(e) => error!("failed to fetch bot identity: {e}"),
        }
    }

    /// Seed the cache directly. Returns `false` when an identity was
    /// already stored; the first value wins.
    pub fn set(&self, identity: BotIdentity) -> bool {
        self.cell.set(identity).is_ok()
    }

    pub fn get(&self) -> Option<&BotIdentity> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::Secret;

    use super::*;

    #[tokio::test]
    async fn failed_fetch_leaves_the_cache_unset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/1/odata.svc/User.GetCurrent()")
            .with_status(500)
            .create_async()
            .await;

        let api = RyverApi::new(&server.url(), Secret::new("token".into()));
        let cache = IdentityCache::new();
        cache.initialize(&api).await;
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn malformed_fetch_leaves_the_cache_unset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/1/odata.svc/User.GetCurrent()")
            .with_status(200)
            .with_body(r#"{"d":{"username":"bot"}}"#)
            .create_async()
            .await;

        let api = RyverApi::new(&server.url(), Secret::new("token".into()));
        let cache = IdentityCache::new();
        cache.initialize(&api).await;
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn successful_fetch_stores_id_and_handle() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/1/odata.svc/User.GetCurrent()")
            .with_status(200)
            .with_body(r#"{"d":{"id":7,"username":"castor","emailAddress":"c@acme.com"}}"#)
            .create_async()
            .await;

        let api = RyverApi::new(&server.url(), Secret::new("token".into()));
        let cache = IdentityCache::new();
        cache.initialize(&api).await;
        assert_eq!(
            cache.get(),
            Some(&BotIdentity {
                id: 7,
                handle: "castor".into()
            })
        );
    }

    #[test]
    fn first_set_wins() {
        let cache = IdentityCache::new();
        let first = BotIdentity {
            id: 1,
            handle: "a".into(),
        };
        let second = BotIdentity {
            id: 2,
            handle: "b".into(),
        };
        assert!(cache.set(first.clone()));
        assert!(!cache.set(second));
        assert_eq!(cache.get(), Some(&first));
    }
}
