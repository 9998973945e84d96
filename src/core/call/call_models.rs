// Call models - the JSON shapes the Mattermost Apps framework sends us.
//
// Every field is optional on the wire because the host only expands what the
// binding asked for. Handlers never poke at the options directly; they go through
// the `require_*` accessors so a missing field turns into a readable error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::errors::AppError;
use crate::core::kv::OAuthUserRecord;

/// One inbound call from the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub values: CallValues,
    #[serde(default)]
    pub context: CallContext,
}

/// Form values and OAuth2 redirect parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallValues {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    /// Everything else (configure form fields and so on).
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CallValues {
    /// Reads a free-form string value, treating blanks as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.extra
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Space separated, e.g. "system_user system_admin".
    #[serde(default)]
    pub roles: Option<String>,
}

impl ActingUser {
    pub fn is_system_admin(&self) -> bool {
        self.roles
            .as_deref()
            .map(|roles| roles.split_whitespace().any(|r| r == "system_admin"))
            .unwrap_or(false)
    }
}

/// Host-supplied descriptor of the configured OAuth2 integration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuth2App {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub connect_url: Option<String>,
    #[serde(default)]
    pub complete_url: Option<String>,
    /// The acting user's stored OAuth2 record, when expanded.
    #[serde(default)]
    pub user: Option<OAuthUserRecord>,
}

impl OAuth2App {
    /// A user counts as connected once a refresh token is stored for them.
    pub fn is_connected(&self) -> bool {
        self.user
            .as_ref()
            .and_then(|u| u.refresh_token.as_deref())
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    pub fn stored_refresh_token(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.refresh_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRef {
    pub id: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallContext {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub mattermost_site_url: Option<String>,
    #[serde(default)]
    pub app_path: Option<String>,
    #[serde(default)]
    pub bot_user_id: Option<String>,
    #[serde(default)]
    pub bot_access_token: Option<String>,
    #[serde(default)]
    pub acting_user: Option<ActingUser>,
    #[serde(default)]
    pub acting_user_access_token: Option<String>,
    #[serde(default)]
    pub oauth2: Option<OAuth2App>,
    #[serde(default)]
    pub post: Option<PostRef>,
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} in call context", field)))
}

impl CallContext {
    pub fn require_site_url(&self) -> Result<&str, AppError> {
        required(self.mattermost_site_url.as_deref(), "mattermost_site_url")
    }

    pub fn require_bot_access_token(&self) -> Result<&str, AppError> {
        required(self.bot_access_token.as_deref(), "bot_access_token")
    }

    pub fn require_bot_user_id(&self) -> Result<&str, AppError> {
        required(self.bot_user_id.as_deref(), "bot_user_id")
    }

    pub fn require_acting_user_access_token(&self) -> Result<&str, AppError> {
        required(
            self.acting_user_access_token.as_deref(),
            "acting_user_access_token",
        )
    }

    pub fn require_acting_user(&self) -> Result<&ActingUser, AppError> {
        self.acting_user
            .as_ref()
            .filter(|u| !u.id.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing acting_user in call context".to_string()))
    }

    pub fn require_post_id(&self) -> Result<&str, AppError> {
        required(self.post.as_ref().map(|p| p.id.as_str()), "post")
    }

    pub fn oauth2(&self) -> Option<&OAuth2App> {
        self.oauth2.as_ref()
    }

    pub fn require_oauth2(&self) -> Result<&OAuth2App, AppError> {
        self.oauth2
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Missing oauth2 in call context".to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.oauth2().map(OAuth2App::is_connected).unwrap_or(false)
    }
}
