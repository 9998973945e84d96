// Call handlers, one file per feature.
//
// Every handler takes the shared state and the parsed call and returns a
// `CallResponse` or an `AppError`; `responses::render` does the rest.

pub mod configure;

pub mod help;

pub mod oauth;

pub mod upload;

pub const BINDINGS_PATH: &str = "/bindings";
pub const INSTALL_PATH: &str = "/install";
pub const HELP_PATH: &str = "/help";
pub const CONFIGURE_FORM_PATH: &str = "/configure/form";
pub const CONFIGURE_SUBMIT_PATH: &str = "/configure/submit";
pub const CONNECT_SUBMIT_PATH: &str = "/connect/submit";
pub const DISCONNECT_SUBMIT_PATH: &str = "/disconnect/submit";
pub const OAUTH2_CONNECT_PATH: &str = "/oauth2/connect";
pub const OAUTH2_COMPLETE_PATH: &str = "/oauth2/complete";
pub const SAVE_FILE_CALL_PATH: &str = "/save-file/call";
pub use crate::core::upload::upload_service::SAVE_FILE_SUBMIT_PATH;
