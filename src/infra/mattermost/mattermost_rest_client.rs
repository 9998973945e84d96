// =============================================================================
// MATTERMOST REST CLIENT
// =============================================================================
//
// One reqwest client for everything the app asks of the Mattermost server:
// - `/api/v4` posts, file info, file downloads and bot DMs (`MattermostApi`)
// - the Apps plugin's KV and OAuth2 storage endpoints (`KvStore`)
//
// The token on `MattermostAuth` decides whose permissions (and whose KV
// namespace) a request runs under.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::kv::{KvStore, OAuth2AppCredentials, OAuthUserRecord, StoreError};
use crate::core::mattermost::{FileInfo, MattermostApi, MattermostAuth, MattermostError, Post};

const APPS_API_PATH: &str = "/plugins/com.mattermost.apps/api/v1";
const REST_API_PATH: &str = "/api/v4";

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
}

pub struct MattermostRestClient {
    client: Client,
}

impl MattermostRestClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn rest_url(auth: &MattermostAuth, path: &str) -> String {
        format!("{}{}{}", auth.site_url, REST_API_PATH, path)
    }

    fn apps_url(auth: &MattermostAuth, path: &str) -> String {
        format!("{}{}{}", auth.site_url, APPS_API_PATH, path)
    }

    fn authed(builder: RequestBuilder, auth: &MattermostAuth) -> RequestBuilder {
        builder.bearer_auth(&auth.access_token)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, MattermostError> {
        let response = builder
            .send()
            .await
            .map_err(|e| MattermostError::Http(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(MattermostError::Api { status, body })
    }

    /// Same as `send`, but for the KV/OAuth2 storage endpoints.
    async fn send_store(builder: RequestBuilder) -> Result<Response, StoreError> {
        Self::send(builder).await.map_err(|e| match e {
            MattermostError::Http(msg) => StoreError::Http(msg),
            MattermostError::Api { status, body } => StoreError::Api { status, body },
        })
    }
}

impl Default for MattermostRestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MattermostApi for MattermostRestClient {
    async fn get_post(
        &self,
        auth: &MattermostAuth,
        post_id: &str,
    ) -> Result<Post, MattermostError> {
        let url = Self::rest_url(auth, &format!("/posts/{}", post_id));
        Self::send(Self::authed(self.client.get(&url), auth))
            .await?
            .json()
            .await
            .map_err(|e| MattermostError::Http(format!("invalid post: {}", e)))
    }

    async fn get_file_info(
        &self,
        auth: &MattermostAuth,
        file_id: &str,
    ) -> Result<FileInfo, MattermostError> {
        let url = Self::rest_url(auth, &format!("/files/{}/info", file_id));
        Self::send(Self::authed(self.client.get(&url), auth))
            .await?
            .json()
            .await
            .map_err(|e| MattermostError::Http(format!("invalid file info: {}", e)))
    }

    async fn download_file(
        &self,
        auth: &MattermostAuth,
        file_id: &str,
    ) -> Result<Vec<u8>, MattermostError> {
        let url = Self::rest_url(auth, &format!("/files/{}", file_id));
        let bytes = Self::send(Self::authed(self.client.get(&url), auth))
            .await?
            .bytes()
            .await
            .map_err(|e| MattermostError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn post_bot_channel(
        &self,
        auth: &MattermostAuth,
        bot_user_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), MattermostError> {
        let url = Self::rest_url(auth, "/channels/direct");
        let channel: Channel = Self::send(
            Self::authed(self.client.post(&url), auth).json(&[bot_user_id, user_id]),
        )
        .await?
        .json()
        .await
        .map_err(|e| MattermostError::Http(format!("invalid channel: {}", e)))?;

        let url = Self::rest_url(auth, "/posts");
        Self::send(
            Self::authed(self.client.post(&url), auth)
                .json(&json!({ "channel_id": channel.id, "message": message })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for MattermostRestClient {
    async fn get(&self, auth: &MattermostAuth, key: &str) -> Result<Option<Value>, StoreError> {
        let url = Self::apps_url(auth, &format!("/kv/{}", key));
        let response = Self::authed(self.client.get(&url), auth)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(&body)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn set(
        &self,
        auth: &MattermostAuth,
        key: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let url = Self::apps_url(auth, &format!("/kv/{}", key));
        Self::send_store(Self::authed(self.client.put(&url), auth).json(value)).await?;
        Ok(())
    }

    async fn store_oauth2_user(
        &self,
        auth: &MattermostAuth,
        record: &OAuthUserRecord,
    ) -> Result<(), StoreError> {
        let url = Self::apps_url(auth, "/oauth2/user");
        Self::send_store(Self::authed(self.client.post(&url), auth).json(record)).await?;
        Ok(())
    }

    async fn store_oauth2_app(
        &self,
        auth: &MattermostAuth,
        credentials: &OAuth2AppCredentials,
    ) -> Result<(), StoreError> {
        let url = Self::apps_url(auth, "/oauth2/app");
        Self::send_store(Self::authed(self.client.post(&url), auth).json(credentials)).await?;
        Ok(())
    }
}
