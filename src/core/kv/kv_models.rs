use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::kv_store::StoreError;

/// One user's linked Google credential. `{}` on the wire means "disconnected".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthUserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl OAuthUserRecord {
    pub fn connected(refresh_token: &str, user_email: &str) -> Self {
        Self {
            refresh_token: Some(refresh_token.to_string()),
            user_email: Some(user_email.to_string()),
        }
    }

    /// The record stored on disconnect.
    pub fn disconnected() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.refresh_token.is_none() && self.user_email.is_none()
    }
}

// Refresh tokens must never end up in logs.
impl std::fmt::Debug for OAuthUserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthUserRecord")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user_email", &self.user_email)
            .finish()
    }
}

/// OAuth2 client credentials as the host stores them for the app.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuth2AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A single `{ userID: record }` item of the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, OAuthUserRecord>",
    into = "BTreeMap<String, OAuthUserRecord>"
)]
pub struct DirectoryEntry {
    pub user_id: String,
    pub record: OAuthUserRecord,
}

impl TryFrom<BTreeMap<String, OAuthUserRecord>> for DirectoryEntry {
    type Error = String;

    fn try_from(map: BTreeMap<String, OAuthUserRecord>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "directory entry must have exactly one user id, found {}",
                map.len()
            ));
        }
        let (user_id, record) = map
            .into_iter()
            .next()
            .ok_or_else(|| "empty directory entry".to_string())?;
        Ok(Self { user_id, record })
    }
}

impl From<DirectoryEntry> for BTreeMap<String, OAuthUserRecord> {
    fn from(entry: DirectoryEntry) -> Self {
        let mut map = BTreeMap::new();
        map.insert(entry.user_id, entry.record);
        map
    }
}

/// The shared `google_data` directory: user id -> stored Google credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleDirectory {
    #[serde(rename = "userData", default)]
    pub user_data: Vec<DirectoryEntry>,
}

impl GoogleDirectory {
    /// Parses whatever the KV store returned. Absent, `null`, `{}` and a missing
    /// or null `userData` all mean "no users yet". Entries that are not a
    /// single `{userID: record}` object are logged and skipped.
    pub fn from_kv(value: Option<serde_json::Value>) -> Result<Self, StoreError> {
        let value = match value {
            None | Some(serde_json::Value::Null) => return Ok(Self::default()),
            Some(value) => value,
        };

        if !value.is_object() {
            return Err(StoreError::Corrupt(format!(
                "google directory is not an object: {}",
                value
            )));
        }

        let items = match value.get("userData") {
            None | Some(serde_json::Value::Null) => return Ok(Self::default()),
            Some(serde_json::Value::Array(items)) => items,
            Some(other) => {
                return Err(StoreError::Corrupt(format!(
                    "google directory userData is not a list: {}",
                    other
                )))
            }
        };

        let user_data = items
            .iter()
            .filter_map(|item| match DirectoryEntry::deserialize(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed google directory entry");
                    None
                }
            })
            .collect();

        Ok(Self { user_data })
    }

    pub fn to_kv(&self) -> Result<serde_json::Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Drops any existing entries for `user_id`, then appends the new one.
    pub fn upsert(&mut self, user_id: &str, record: OAuthUserRecord) {
        self.user_data.retain(|e| e.user_id != user_id);
        self.user_data.push(DirectoryEntry {
            user_id: user_id.to_string(),
            record,
        });
    }

    /// Removes every entry keyed by `user_id`. Returns how many went away.
    pub fn remove(&mut self, user_id: &str) -> usize {
        let before = self.user_data.len();
        self.user_data.retain(|e| e.user_id != user_id);
        before - self.user_data.len()
    }

    pub fn len(&self) -> usize {
        self.user_data.len()
    }
}

#[cfg(test)]
impl GoogleDirectory {
    pub fn get(&self, user_id: &str) -> Option<&OAuthUserRecord> {
        self.user_data
            .iter()
            .find(|e| e.user_id == user_id)
            .map(|e| &e.record)
    }

    pub fn is_empty(&self) -> bool {
        self.user_data.is_empty()
    }
}
