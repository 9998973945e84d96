// Google side of the app: the OAuth2 handshake and the two Drive calls we make.
//
// The core only describes what it needs from Google. `infra/google` talks HTTP.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::call::OAuth2App;

const SCOPE_PREFIX: &str = "https://www.googleapis.com/auth/";

/// Scopes requested on connect. Order matters only for readability of the URL.
pub const GOOGLE_OAUTH_SCOPES: [&str; 8] = [
    "drive",
    "drive.file",
    "drive.activity",
    "documents",
    "spreadsheets",
    "presentations",
    "userinfo.profile",
    "userinfo.email",
];

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google request failed: {0}")]
    Http(String),
    #[error("Google API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Google response is missing {0}")]
    MissingField(&'static str),
}

/// Client credentials for one OAuth2 exchange.
#[derive(Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl OAuthClient {
    /// Builds credentials from the host's OAuth2 descriptor.
    /// Only the client id is mandatory; Google reports the rest itself.
    pub fn from_app(app: &OAuth2App) -> Result<Self, GoogleError> {
        let client_id = app
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(GoogleError::MissingField("client_id"))?;

        Ok(Self {
            client_id,
            client_secret: app.client_secret.clone().unwrap_or_default(),
            redirect_uri: app.complete_url.clone().unwrap_or_default(),
        })
    }
}

/// Result of exchanging an authorization code.
#[derive(Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// `about.user` from the Drive API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleUser {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// A file to push to Drive.
#[derive(Debug, Clone)]
pub struct DriveUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// What Drive reports back for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

/// Trait describing the Google operations the app needs.
#[async_trait]
pub trait GoogleApi: Send + Sync {
    /// Builds the consent URL. No network call.
    fn authorization_url(&self, client: &OAuthClient, state: &str) -> Result<String, GoogleError>;

    async fn exchange_code(&self, client: &OAuthClient, code: &str)
        -> Result<TokenSet, GoogleError>;

    async fn refresh_access_token(
        &self,
        client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<String, GoogleError>;

    async fn about_user(&self, access_token: &str) -> Result<GoogleUser, GoogleError>;

    async fn upload_file(
        &self,
        access_token: &str,
        upload: DriveUpload,
    ) -> Result<DriveFile, GoogleError>;
}

/// The `scope` parameter: every scope, fully qualified, space separated.
pub fn scope_param() -> String {
    GOOGLE_OAUTH_SCOPES
        .iter()
        .map(|s| format!("{}{}", SCOPE_PREFIX, s))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds an offline-access authorization URL against `auth_endpoint`.
pub fn build_authorization_url(
    auth_endpoint: &str,
    client: &OAuthClient,
    state: &str,
) -> Result<String, GoogleError> {
    let scope = scope_param();
    let url = Url::parse_with_params(
        auth_endpoint,
        &[
            ("access_type", "offline"),
            ("scope", scope.as_str()),
            ("state", state),
            ("response_type", "code"),
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", client.redirect_uri.as_str()),
        ],
    )
    .map_err(|e| GoogleError::Http(format!("invalid authorization endpoint: {}", e)))?;

    Ok(url.to_string())
}
