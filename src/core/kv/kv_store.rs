use async_trait::async_trait;
use thiserror::Error;

use super::kv_models::{GoogleDirectory, OAuth2AppCredentials, OAuthUserRecord};
use crate::core::mattermost::MattermostAuth;

/// Key of the shared user directory.
pub const GOOGLE_DATA_KEY: &str = "google_data";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("KV request failed: {0}")]
    Http(String),
    #[error("KV API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt KV data: {0}")]
    Corrupt(String),
}

/// Host-provided key/value storage. Which scope a call lands in depends on the
/// token in `auth`: the bot token for shared data, the acting user's token for
/// their own OAuth2 record.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(
        &self,
        auth: &MattermostAuth,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    async fn set(
        &self,
        auth: &MattermostAuth,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Overwrites the acting user's OAuth2 record.
    async fn store_oauth2_user(
        &self,
        auth: &MattermostAuth,
        record: &OAuthUserRecord,
    ) -> Result<(), StoreError>;

    /// Saves the OAuth2 client credentials for the app.
    async fn store_oauth2_app(
        &self,
        auth: &MattermostAuth,
        credentials: &OAuth2AppCredentials,
    ) -> Result<(), StoreError>;
}

/// Reads the shared directory, defaulting to empty.
pub async fn load_directory(
    store: &dyn KvStore,
    auth: &MattermostAuth,
) -> Result<GoogleDirectory, StoreError> {
    let raw = store.get(auth, GOOGLE_DATA_KEY).await?;
    GoogleDirectory::from_kv(raw)
}

// No compare-and-swap in the host KV API: concurrent writers race and the last
// one wins on the whole list.
pub async fn save_directory(
    store: &dyn KvStore,
    auth: &MattermostAuth,
    directory: &GoogleDirectory,
) -> Result<(), StoreError> {
    store.set(auth, GOOGLE_DATA_KEY, &directory.to_kv()?).await
}
