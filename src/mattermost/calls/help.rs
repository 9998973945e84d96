use crate::core::call::{CallContext, CallResponse};
use crate::core::markdown::bullet_list;

pub const INSTALL_MESSAGE: &str = "Google Drive app installed. A system administrator needs to run `/drive configure` with the Google OAuth2 client credentials, then everyone can run `/drive connect`.";

pub fn install() -> CallResponse {
    tracing::info!("App installed");
    CallResponse::markdown(INSTALL_MESSAGE)
}

/// Command list for `/drive help`. Admins also see `configure`.
pub fn help(context: &CallContext) -> CallResponse {
    let mut commands = vec![
        "`/drive connect` - link your Google account",
        "`/drive disconnect` - unlink your Google account",
        "`/drive help` - show this message",
    ];
    if context
        .acting_user
        .as_ref()
        .map(|u| u.is_system_admin())
        .unwrap_or(false)
    {
        commands.push("`/drive configure` - set the Google OAuth2 client credentials");
    }

    CallResponse::markdown(format!(
        "#### Google Drive\n{}\n\nOnce connected, use **Upload to Google Drive** from a post's menu to copy its attachments to your Drive.",
        bullet_list(commands)
    ))
}
