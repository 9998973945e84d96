use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MattermostError {
    #[error("Mattermost request failed: {0}")]
    Http(String),
    #[error("Mattermost API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Site URL plus the token a request runs as (bot or acting user).
#[derive(Clone)]
pub struct MattermostAuth {
    pub site_url: String,
    pub access_token: String,
}

impl MattermostAuth {
    pub fn new(site_url: &str, access_token: &str) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }
}

impl std::fmt::Debug for MattermostAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MattermostAuth")
            .field("site_url", &self.site_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
}

/// The slice of the Mattermost REST API the app uses.
#[async_trait]
pub trait MattermostApi: Send + Sync {
    async fn get_post(&self, auth: &MattermostAuth, post_id: &str)
        -> Result<Post, MattermostError>;

    async fn get_file_info(
        &self,
        auth: &MattermostAuth,
        file_id: &str,
    ) -> Result<FileInfo, MattermostError>;

    async fn download_file(
        &self,
        auth: &MattermostAuth,
        file_id: &str,
    ) -> Result<Vec<u8>, MattermostError>;

    /// Posts `message` into the direct channel between the bot and `user_id`.
    async fn post_bot_channel(
        &self,
        auth: &MattermostAuth,
        bot_user_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), MattermostError>;
}
