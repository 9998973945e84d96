// =============================================================================
// GOOGLE API CLIENT
// =============================================================================
//
// reqwest implementation of the core `GoogleApi` trait.
//
// **Calls we make:**
// - OAuth2 token endpoint: authorization-code exchange and refresh-token grant
// - Drive v3 `about.get` with `fields=user` to learn the account's email
// - Drive v3 multipart upload (`multipart/related`: JSON metadata + media)
//
// Every endpoint comes from `GoogleEndpoints`, so tests can aim the client at a
// local mock server instead of Google.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::google::{
    build_authorization_url, DriveFile, DriveUpload, GoogleApi, GoogleError, GoogleUser,
    OAuthClient, TokenSet,
};

/// Where the Google APIs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    /// Drive v3 base, e.g. `https://www.googleapis.com/drive/v3`.
    pub drive_api_url: String,
    /// Drive v3 upload base, e.g. `https://www.googleapis.com/upload/drive/v3`.
    pub upload_api_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            drive_api_url: "https://www.googleapis.com/drive/v3".to_string(),
            upload_api_url: "https://www.googleapis.com/upload/drive/v3".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AboutResponse {
    user: Option<GoogleUser>,
}

pub struct GoogleApiClient {
    client: Client,
    endpoints: GoogleEndpoints,
}

impl GoogleApiClient {
    pub fn new(endpoints: GoogleEndpoints) -> Self {
        Self {
            client: Client::new(),
            endpoints,
        }
    }

    /// Turns a non-2xx response into `GoogleError::Api` with the body attached.
    async fn check(response: Response) -> Result<Response, GoogleError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        Err(GoogleError::Api { status, body })
    }

    fn boundary() -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        format!("drive_upload_{:x}", nanos)
    }

    /// Body for Drive's `uploadType=multipart`.
    fn multipart_related(
        boundary: &str,
        upload: &DriveUpload,
    ) -> Result<Vec<u8>, GoogleError> {
        let metadata = serde_json::json!({
            "name": upload.name,
            "mimeType": upload.mime_type,
        });
        let metadata = serde_json::to_string(&metadata)
            .map_err(|e| GoogleError::Http(format!("failed to encode metadata: {}", e)))?;

        let mut body = Vec::with_capacity(upload.bytes.len() + metadata.len() + 256);
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n",
                b = boundary,
                m = metadata,
                t = upload.mime_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&upload.bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        Ok(body)
    }
}

#[async_trait]
impl GoogleApi for GoogleApiClient {
    fn authorization_url(&self, client: &OAuthClient, state: &str) -> Result<String, GoogleError> {
        build_authorization_url(&self.endpoints.auth_url, client, state)
    }

    async fn exchange_code(
        &self,
        client: &OAuthClient,
        code: &str,
    ) -> Result<TokenSet, GoogleError> {
        tracing::debug!("Exchanging Google authorization code");

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&[
                ("code", code),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("redirect_uri", client.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| GoogleError::Http(e.to_string()))?;

        Self::check(response)
            .await?
            .json::<TokenSet>()
            .await
            .map_err(|e| GoogleError::Http(format!("invalid token response: {}", e)))
    }

    async fn refresh_access_token(
        &self,
        client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<String, GoogleError> {
        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| GoogleError::Http(e.to_string()))?;

        let refreshed: RefreshResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GoogleError::Http(format!("invalid refresh response: {}", e)))?;
        Ok(refreshed.access_token)
    }

    async fn about_user(&self, access_token: &str) -> Result<GoogleUser, GoogleError> {
        let url = format!("{}/about", self.endpoints.drive_api_url);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", "user")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GoogleError::Http(e.to_string()))?;

        let about: AboutResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GoogleError::Http(format!("invalid about response: {}", e)))?;
        about.user.ok_or(GoogleError::MissingField("user"))
    }

    async fn upload_file(
        &self,
        access_token: &str,
        upload: DriveUpload,
    ) -> Result<DriveFile, GoogleError> {
        let boundary = Self::boundary();
        let body = Self::multipart_related(&boundary, &upload)?;
        let url = format!("{}/files", self.endpoints.upload_api_url);

        tracing::debug!(
            name = %upload.name,
            bytes = upload.bytes.len(),
            "Uploading file to Google Drive"
        );

        let response = self
            .client
            .post(&url)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,name,webViewLink"),
            ])
            .bearer_auth(access_token)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| GoogleError::Http(e.to_string()))?;

        Self::check(response)
            .await?
            .json::<DriveFile>()
            .await
            .map_err(|e| GoogleError::Http(format!("invalid upload response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn endpoints(base: &str) -> GoogleEndpoints {
        GoogleEndpoints {
            auth_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            drive_api_url: format!("{}/drive/v3", base),
            upload_api_url: format!("{}/upload/drive/v3", base),
        }
    }

    fn oauth_client() -> OAuthClient {
        OAuthClient {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            redirect_uri: "http://mm.local/complete".to_string(),
        }
    }

    #[test]
    fn authorization_url_uses_the_configured_endpoint() {
        let client = GoogleApiClient::new(endpoints("http://google.test"));
        let url = client.authorization_url(&oauth_client(), "s1").unwrap();
        assert!(url.starts_with("http://google.test/o/oauth2/v2/auth?access_type=offline"));
    }

    #[tokio::test]
    async fn exchange_code_posts_the_authorization_code_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "4/abc".into()),
                Matcher::UrlEncoded("client_id".into(), "cid".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "http://mm.local/complete".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.a","refresh_token":"1//r","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let client = GoogleApiClient::new(endpoints(&server.url()));
        let tokens = client.exchange_code(&oauth_client(), "4/abc").await.unwrap();

        assert_eq!(tokens.access_token, "ya29.a");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//r"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_uses_the_refresh_token_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//r".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.fresh","expires_in":3599}"#)
            .create_async()
            .await;

        let client = GoogleApiClient::new(endpoints(&server.url()));
        let token = client
            .refresh_access_token(&oauth_client(), "1//r")
            .await
            .unwrap();

        assert_eq!(token, "ya29.fresh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn about_user_reads_the_email_address() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/drive/v3/about")
            .match_query(Matcher::UrlEncoded("fields".into(), "user".into()))
            .match_header("authorization", "Bearer ya29.a")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"user":{"kind":"drive#user","displayName":"Alice","emailAddress":"alice@example.com"}}"#)
            .create_async()
            .await;

        let client = GoogleApiClient::new(endpoints(&server.url()));
        let user = client.about_user("ya29.a").await.unwrap();

        assert_eq!(user.email_address.as_deref(), Some("alice@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_errors_keep_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/about")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid_token")
            .create_async()
            .await;

        let client = GoogleApiClient::new(endpoints(&server.url()));
        let err = client.about_user("bad").await.unwrap_err();

        match err {
            GoogleError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid_token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_sends_a_multipart_related_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload/drive/v3/files")
            .match_query(Matcher::UrlEncoded("uploadType".into(), "multipart".into()))
            .match_header("authorization", "Bearer ya29.a")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/related; boundary=drive_upload_[0-9a-f]+$".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""name":"notes.txt""#.into()),
                Matcher::Regex("Content-Type: text/plain".into()),
                Matcher::Regex("hello drive".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"d1","name":"notes.txt","webViewLink":"https://drive.google.com/file/d/d1/view"}"#)
            .create_async()
            .await;

        let client = GoogleApiClient::new(endpoints(&server.url()));
        let file = client
            .upload_file(
                "ya29.a",
                DriveUpload {
                    name: "notes.txt".to_string(),
                    mime_type: "text/plain".to_string(),
                    bytes: b"hello drive".to_vec(),
                },
            )
            .await
            .unwrap();

        assert_eq!(file.id, "d1");
        assert_eq!(
            file.web_view_link.as_deref(),
            Some("https://drive.google.com/file/d/d1/view")
        );
        mock.assert_async().await;
    }

    #[test]
    fn multipart_body_is_framed_by_the_boundary() {
        let upload = DriveUpload {
            name: "a.bin".to_string(),
            mime_type: "application/octet-stream".to_string(),
            bytes: vec![0, 1, 2],
        };
        let body = GoogleApiClient::multipart_related("XYZ", &upload).unwrap();
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--XYZ\r\nContent-Type: application/json"));
        assert!(text.ends_with("\r\n--XYZ--\r\n"));
        assert_eq!(text.matches("--XYZ\r\n").count(), 2);
    }
}
