// In-memory implementation of the KvStore trait.
//
// The host namespaces KV data by the token a request is made with, so this store
// does the same: every entry is keyed by (access token, key). Test-only: the
// host fills `context.oauth2` from its own storage, which this never reaches.

use crate::core::kv::{KvStore, OAuth2AppCredentials, OAuthUserRecord, StoreError};
use crate::core::mattermost::MattermostAuth;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct ScopedKey {
    token: String,
    key: String,
}

pub struct InMemoryKvStore {
    values: DashMap<ScopedKey, serde_json::Value>,
    /// Acting user token -> stored OAuth2 user.
    oauth2_users: DashMap<String, OAuthUserRecord>,
    /// Site URL -> app credentials.
    oauth2_apps: DashMap<String, OAuth2AppCredentials>,
    calls: AtomicUsize,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            oauth2_users: DashMap::new(),
            oauth2_apps: DashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Seeds a raw value, bypassing the call counter.
    pub fn insert_raw(&self, token: &str, key: &str, value: serde_json::Value) {
        self.values.insert(
            ScopedKey {
                token: token.to_string(),
                key: key.to_string(),
            },
            value,
        );
    }

    pub fn raw(&self, token: &str, key: &str) -> Option<serde_json::Value> {
        self.values
            .get(&ScopedKey {
                token: token.to_string(),
                key: key.to_string(),
            })
            .map(|v| v.clone())
    }

    pub fn oauth2_user(&self, token: &str) -> Option<OAuthUserRecord> {
        self.oauth2_users.get(token).map(|r| r.clone())
    }

    pub fn oauth2_app(&self, site_url: &str) -> Option<OAuth2AppCredentials> {
        self.oauth2_apps.get(site_url).map(|c| c.clone())
    }

    /// How many trait calls have hit this store.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(
        &self,
        auth: &MattermostAuth,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        self.touch();
        Ok(self.raw(&auth.access_token, key))
    }

    async fn set(
        &self,
        auth: &MattermostAuth,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.touch();
        self.insert_raw(&auth.access_token, key, value.clone());
        Ok(())
    }

    async fn store_oauth2_user(
        &self,
        auth: &MattermostAuth,
        record: &OAuthUserRecord,
    ) -> Result<(), StoreError> {
        self.touch();
        self.oauth2_users
            .insert(auth.access_token.clone(), record.clone());
        Ok(())
    }

    async fn store_oauth2_app(
        &self,
        auth: &MattermostAuth,
        credentials: &OAuth2AppCredentials,
    ) -> Result<(), StoreError> {
        self.touch();
        self.oauth2_apps
            .insert(auth.site_url.clone(), credentials.clone());
        Ok(())
    }
}
