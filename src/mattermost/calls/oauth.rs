use serde_json::Value;

use crate::core::call::{CallRequest, CallResponse};
use crate::core::errors::AppError;
use crate::core::oauth::oauth_service::DISCONNECTED_MESSAGE;
use crate::mattermost::AppState;

/// `/drive connect`
pub async fn connect(state: &AppState, call: &CallRequest) -> Result<CallResponse, AppError> {
    let message = state.oauth.connect_link(&call.context)?;
    Ok(CallResponse::markdown(message))
}

/// The host asks where to send the user; the URL goes back as `data`.
pub async fn oauth2_connect(
    state: &AppState,
    call: &CallRequest,
) -> Result<CallResponse, AppError> {
    let url = state.oauth.connect_url(&call.context, &call.values)?;
    Ok(CallResponse::data(Value::String(url)))
}

pub async fn oauth2_complete(
    state: &AppState,
    call: &CallRequest,
) -> Result<CallResponse, AppError> {
    state.oauth.complete(&call.context, &call.values).await?;
    Ok(CallResponse::ok())
}

/// `/drive disconnect`
pub async fn disconnect(state: &AppState, call: &CallRequest) -> Result<CallResponse, AppError> {
    state.oauth.disconnect(&call.context).await?;
    Ok(CallResponse::markdown(DISCONNECTED_MESSAGE))
}
