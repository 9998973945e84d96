// OAuth lifecycle - connect link, consent URL, completion and disconnect.
//
// Platform-agnostic like the rest of core: it only sees the call context and the
// three collaborator traits. Every operation is one sequential chain; the first
// failure aborts and nothing already written is rolled back.

use std::sync::Arc;

use crate::core::call::{CallContext, CallValues};
use crate::core::errors::AppError;
use crate::core::google::{GoogleApi, GoogleError, OAuthClient};
use crate::core::kv::{load_directory, save_directory, KvStore, OAuthUserRecord};
use crate::core::markdown::hyperlink;
use crate::core::mattermost::{MattermostApi, MattermostAuth};

pub const ALREADY_CONNECTED_MESSAGE: &str = "You are already logged into Google";
pub const MISSING_CODE_MESSAGE: &str = "Bad Request: code param not provided";
pub const NO_SESSION_MESSAGE: &str = "Impossible to disconnect. There is no active session";
pub const CONNECTED_MESSAGE: &str = "You have successfully connected your Google account!";
pub const DISCONNECTED_MESSAGE: &str = "You have successfully disconnected your Google account!";

pub struct OAuthService {
    google: Arc<dyn GoogleApi>,
    mattermost: Arc<dyn MattermostApi>,
    kv: Arc<dyn KvStore>,
}

impl OAuthService {
    pub fn new(
        google: Arc<dyn GoogleApi>,
        mattermost: Arc<dyn MattermostApi>,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            google,
            mattermost,
            kv,
        }
    }

    /// Tells the user whether they are connected, or where to go to connect.
    pub fn connect_link(&self, context: &CallContext) -> Result<String, AppError> {
        if context.is_connected() {
            return Ok(ALREADY_CONNECTED_MESSAGE.to_string());
        }

        let connect_url = context
            .oauth2()
            .and_then(|o| o.connect_url.as_deref())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing oauth2.connect_url in call context".into()))?;

        Ok(format!(
            "Follow this {} to connect Mattermost to your Google Account.",
            hyperlink("link", connect_url)
        ))
    }

    /// Builds Google's consent URL. `state` is passed through untouched.
    pub fn connect_url(
        &self,
        context: &CallContext,
        values: &CallValues,
    ) -> Result<String, AppError> {
        let client = OAuthClient::from_app(context.require_oauth2()?)?;
        let state = values.state.as_deref().unwrap_or_default();
        Ok(self.google.authorization_url(&client, state)?)
    }

    /// Finishes the OAuth2 dance: exchange the code, look up the Google account,
    /// store the credential for the user and in the shared directory, then DM
    /// the user.
    pub async fn complete(
        &self,
        context: &CallContext,
        values: &CallValues,
    ) -> Result<(), AppError> {
        let code = match values.code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => code,
            None => {
                let message = values
                    .error_description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or(MISSING_CODE_MESSAGE);
                return Err(AppError::BadRequest(message.to_string()));
            }
        };

        let site_url = context.require_site_url()?;
        let bot_token = context.require_bot_access_token()?;
        let bot_user_id = context.require_bot_user_id()?;
        let user_token = context.require_acting_user_access_token()?;
        let user_id = context.require_acting_user()?.id.as_str();

        let client = OAuthClient::from_app(context.require_oauth2()?)?;
        let tokens = self.google.exchange_code(&client, code).await?;
        let refresh_token = tokens
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::google_failed("no refresh token was returned"))?;

        let about = self
            .google
            .about_user(&tokens.access_token)
            .await
            .map_err(AppError::google_failed)?;
        let email = about
            .email_address
            .ok_or_else(|| AppError::google_failed(GoogleError::MissingField("user.emailAddress")))?;

        let record = OAuthUserRecord::connected(&refresh_token, &email);

        let user_auth = MattermostAuth::new(site_url, user_token);
        self.kv.store_oauth2_user(&user_auth, &record).await?;

        let bot_auth = MattermostAuth::new(site_url, bot_token);
        let mut directory = load_directory(self.kv.as_ref(), &bot_auth).await?;
        directory.upsert(user_id, record);
        save_directory(self.kv.as_ref(), &bot_auth, &directory).await?;

        tracing::info!(
            user_id = user_id,
            email = %email,
            directory_size = directory.len(),
            "Google account connected"
        );

        self.mattermost
            .post_bot_channel(&bot_auth, bot_user_id, user_id, CONNECTED_MESSAGE)
            .await?;

        Ok(())
    }

    /// Forgets the user's Google credential everywhere we stored it.
    pub async fn disconnect(&self, context: &CallContext) -> Result<(), AppError> {
        if !context.is_connected() {
            return Err(AppError::markdown(NO_SESSION_MESSAGE));
        }

        let site_url = context.require_site_url()?;
        let bot_token = context.require_bot_access_token()?;
        let bot_user_id = context.require_bot_user_id()?;
        let user_token = context.require_acting_user_access_token()?;
        let user_id = context.require_acting_user()?.id.as_str();

        let user_auth = MattermostAuth::new(site_url, user_token);
        self.kv
            .store_oauth2_user(&user_auth, &OAuthUserRecord::disconnected())
            .await?;

        let bot_auth = MattermostAuth::new(site_url, bot_token);
        let mut directory = load_directory(self.kv.as_ref(), &bot_auth).await?;
        let removed = directory.remove(user_id);
        save_directory(self.kv.as_ref(), &bot_auth, &directory).await?;

        if removed == 0 {
            tracing::debug!(user_id = user_id, "User was not in the Google directory");
        }
        tracing::info!(user_id = user_id, "Google account disconnected");

        self.mattermost
            .post_bot_channel(&bot_auth, bot_user_id, user_id, DISCONNECTED_MESSAGE)
            .await?;

        Ok(())
    }
}
