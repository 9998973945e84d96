use crate::core::call::{CallRequest, CallResponse};
use crate::core::errors::AppError;
use crate::mattermost::AppState;

/// Post menu item: confirm before uploading.
pub async fn save_file_form(
    state: &AppState,
    call: &CallRequest,
) -> Result<CallResponse, AppError> {
    let form = state.upload.confirmation_form(&call.context).await?;
    Ok(CallResponse::form(form))
}

pub async fn save_file_submit(
    state: &AppState,
    call: &CallRequest,
) -> Result<CallResponse, AppError> {
    let report = state.upload.submit(&call.context).await?;
    Ok(CallResponse::markdown(report.to_markdown()))
}
