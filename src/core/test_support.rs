// Shared fakes for the core service tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::call::call_models::{ActingUser, CallContext, OAuth2App, PostRef};
use crate::core::google::{
    build_authorization_url, DriveFile, DriveUpload, GoogleApi, GoogleError, GoogleUser,
    OAuthClient, TokenSet,
};
use crate::core::kv::OAuthUserRecord;
use crate::core::mattermost::{FileInfo, MattermostApi, MattermostAuth, MattermostError, Post};

pub const SITE_URL: &str = "http://mm.local";
pub const BOT_TOKEN: &str = "bot-token";
pub const USER_TOKEN: &str = "user-token";
pub const BOT_ID: &str = "bot1";
pub const USER_ID: &str = "u1";

pub struct FakeGoogle {
    pub refresh_token: Option<String>,
    pub email: Option<String>,
    pub fail_about: bool,
    pub fail_upload_named: Option<String>,
    pub exchanged_codes: Mutex<Vec<String>>,
    pub refreshed_with: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<DriveUpload>>,
}

impl FakeGoogle {
    pub fn new() -> Self {
        Self {
            refresh_token: Some("1//refresh".to_string()),
            email: Some("alice@example.com".to_string()),
            fail_about: false,
            fail_upload_named: None,
            exchanged_codes: Mutex::new(Vec::new()),
            refreshed_with: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GoogleApi for FakeGoogle {
    fn authorization_url(&self, client: &OAuthClient, state: &str) -> Result<String, GoogleError> {
        build_authorization_url("https://accounts.google.com/o/oauth2/v2/auth", client, state)
    }

    async fn exchange_code(
        &self,
        _client: &OAuthClient,
        code: &str,
    ) -> Result<TokenSet, GoogleError> {
        self.exchanged_codes.lock().unwrap().push(code.to_string());
        Ok(TokenSet {
            access_token: "ya29.access".to_string(),
            refresh_token: self.refresh_token.clone(),
        })
    }

    async fn refresh_access_token(
        &self,
        _client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<String, GoogleError> {
        self.refreshed_with
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        Ok("ya29.refreshed".to_string())
    }

    async fn about_user(&self, _access_token: &str) -> Result<GoogleUser, GoogleError> {
        if self.fail_about {
            return Err(GoogleError::Api {
                status: 403,
                body: "insufficientPermissions".to_string(),
            });
        }
        Ok(GoogleUser {
            display_name: Some("Alice".to_string()),
            email_address: self.email.clone(),
        })
    }

    async fn upload_file(
        &self,
        _access_token: &str,
        upload: DriveUpload,
    ) -> Result<DriveFile, GoogleError> {
        if self.fail_upload_named.as_deref() == Some(upload.name.as_str()) {
            return Err(GoogleError::Api {
                status: 507,
                body: "storageQuotaExceeded".to_string(),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        let id = format!("drive-{}", uploads.len() + 1);
        let file = DriveFile {
            id: id.clone(),
            name: upload.name.clone(),
            web_view_link: Some(format!("https://drive.google.com/file/d/{}/view", id)),
        };
        uploads.push(upload);
        Ok(file)
    }
}

pub struct FakeMattermost {
    pub posts: Mutex<HashMap<String, Post>>,
    pub files: Mutex<HashMap<String, (FileInfo, Vec<u8>)>>,
    /// (bot id, user id, message) per DM sent.
    pub dms: Mutex<Vec<(String, String, String)>>,
}

impl FakeMattermost {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
            dms: Mutex::new(Vec::new()),
        }
    }

    pub fn with_post(self, id: &str, files: &[(&str, &str, &str)]) -> Self {
        let post = Post {
            id: id.to_string(),
            channel_id: "c1".to_string(),
            message: String::new(),
            file_ids: files.iter().map(|(fid, _, _)| fid.to_string()).collect(),
        };
        self.posts.lock().unwrap().insert(id.to_string(), post);
        for (fid, name, mime) in files {
            let info = FileInfo {
                id: fid.to_string(),
                name: name.to_string(),
                mime_type: mime.to_string(),
                size: 3,
            };
            self.files
                .lock()
                .unwrap()
                .insert(fid.to_string(), (info, b"abc".to_vec()));
        }
        self
    }

    pub fn dm_messages(&self) -> Vec<String> {
        self.dms
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, m)| m.clone())
            .collect()
    }
}

fn not_found(what: &str) -> MattermostError {
    MattermostError::Api {
        status: 404,
        body: format!("{} not found", what),
    }
}

#[async_trait]
impl MattermostApi for FakeMattermost {
    async fn get_post(
        &self,
        _auth: &MattermostAuth,
        post_id: &str,
    ) -> Result<Post, MattermostError> {
        self.posts
            .lock()
            .unwrap()
            .get(post_id)
            .cloned()
            .ok_or_else(|| not_found("post"))
    }

    async fn get_file_info(
        &self,
        _auth: &MattermostAuth,
        file_id: &str,
    ) -> Result<FileInfo, MattermostError> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| not_found("file"))
    }

    async fn download_file(
        &self,
        _auth: &MattermostAuth,
        file_id: &str,
    ) -> Result<Vec<u8>, MattermostError> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| not_found("file"))
    }

    async fn post_bot_channel(
        &self,
        _auth: &MattermostAuth,
        bot_user_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), MattermostError> {
        self.dms.lock().unwrap().push((
            bot_user_id.to_string(),
            user_id.to_string(),
            message.to_string(),
        ));
        Ok(())
    }
}

/// A fully expanded context for `USER_ID`, optionally already connected.
pub fn call_context(connected: bool) -> CallContext {
    CallContext {
        app_id: Some("google-drive".to_string()),
        mattermost_site_url: Some(SITE_URL.to_string()),
        app_path: Some("/plugins/com.mattermost.apps/apps/google-drive".to_string()),
        bot_user_id: Some(BOT_ID.to_string()),
        bot_access_token: Some(BOT_TOKEN.to_string()),
        acting_user: Some(ActingUser {
            id: USER_ID.to_string(),
            username: Some("alice".to_string()),
            roles: Some("system_user".to_string()),
        }),
        acting_user_access_token: Some(USER_TOKEN.to_string()),
        oauth2: Some(OAuth2App {
            client_id: Some("cid.apps.googleusercontent.com".to_string()),
            client_secret: Some("client-secret".to_string()),
            connect_url: Some(format!(
                "{}/plugins/com.mattermost.apps/apps/google-drive/oauth2/remote/connect",
                SITE_URL
            )),
            complete_url: Some(format!(
                "{}/plugins/com.mattermost.apps/apps/google-drive/oauth2/remote/complete",
                SITE_URL
            )),
            user: connected.then(|| OAuthUserRecord::connected("1//stored", "alice@example.com")),
        }),
        post: Some(PostRef {
            id: "p1".to_string(),
            file_ids: Vec::new(),
        }),
    }
}
