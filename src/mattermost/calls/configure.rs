// `/drive configure`: lets a system admin set the Google OAuth2 client the
// host uses for the remote OAuth2 flow.

use crate::core::call::{
    AppForm, CallContext, CallRequest, CallResponse, Expand, ExpandLevel, FormField, FormSubmit,
};
use crate::core::errors::AppError;
use crate::core::kv::OAuth2AppCredentials;
use crate::core::mattermost::MattermostAuth;
use crate::core::upload::upload_service::GOOGLE_DRIVE_ICON;
use crate::mattermost::calls::CONFIGURE_SUBMIT_PATH;
use crate::mattermost::AppState;

pub const NOT_ADMIN_MESSAGE: &str =
    "Only a system administrator can configure the Google Drive app.";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Both a Client ID and a Client Secret are required.";
pub const CONFIGURED_MESSAGE: &str =
    "Google OAuth2 client saved. Users can now run `/drive connect`.";

fn require_admin(context: &CallContext) -> Result<(), AppError> {
    if context.require_acting_user()?.is_system_admin() {
        Ok(())
    } else {
        Err(AppError::markdown(NOT_ADMIN_MESSAGE))
    }
}

pub fn configure_form(call: &CallRequest) -> Result<CallResponse, AppError> {
    require_admin(&call.context)?;

    let current = call.context.oauth2();
    let client_id = current.and_then(|o| o.client_id.clone());
    let client_secret = current.and_then(|o| o.client_secret.clone());

    Ok(CallResponse::form(AppForm {
        title: "Configure Google Drive".to_string(),
        header: "Enter the OAuth2 client from the Google Cloud console.".to_string(),
        icon: GOOGLE_DRIVE_ICON.to_string(),
        fields: vec![
            FormField::text("client_id", "client-id", "Client ID").with_value(client_id),
            FormField::text("client_secret", "client-secret", "Client Secret")
                .with_value(client_secret)
                .secret(),
        ],
        submit: FormSubmit {
            path: CONFIGURE_SUBMIT_PATH.to_string(),
            expand: Expand {
                acting_user: Some(ExpandLevel::Summary),
                acting_user_access_token: Some(ExpandLevel::All),
                oauth2_app: Some(ExpandLevel::All),
                ..Default::default()
            },
        },
    }))
}

pub async fn configure_submit(
    state: &AppState,
    call: &CallRequest,
) -> Result<CallResponse, AppError> {
    let context = &call.context;
    require_admin(context)?;

    let (client_id, client_secret) = match (
        call.values.text("client_id"),
        call.values.text("client_secret"),
    ) {
        (Some(id), Some(secret)) => (id, secret),
        _ => return Err(AppError::markdown(MISSING_CREDENTIALS_MESSAGE)),
    };

    let auth = MattermostAuth::new(
        context.require_site_url()?,
        context.require_acting_user_access_token()?,
    );
    let credentials = OAuth2AppCredentials {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    };
    state.kv.store_oauth2_app(&auth, &credentials).await?;

    tracing::info!(client_id = %credentials.client_id, "Google OAuth2 client configured");
    Ok(CallResponse::markdown(CONFIGURED_MESSAGE))
}
