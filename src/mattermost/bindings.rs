// Where the app shows up in Mattermost: the `/drive` command tree and the
// post menu item. Bindings are recomputed on every `/bindings` call, so they
// follow the acting user's connection state and role.

use serde::Serialize;

use crate::core::call::{CallContext, Expand, ExpandLevel, FormSubmit};
use crate::core::upload::upload_service::GOOGLE_DRIVE_ICON;
use crate::mattermost::calls::{
    CONFIGURE_FORM_PATH, CONNECT_SUBMIT_PATH, DISCONNECT_SUBMIT_PATH, HELP_PATH,
    SAVE_FILE_CALL_PATH,
};

pub const COMMAND_TRIGGER: &str = "drive";
pub const UPLOAD_MENU_LABEL: &str = "Upload to Google Drive";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<FormSubmit>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
}

impl Binding {
    fn location(location: &str, bindings: Vec<Binding>) -> Self {
        Self {
            location: location.to_string(),
            label: None,
            icon: None,
            description: None,
            hint: None,
            submit: None,
            bindings,
        }
    }

    fn call(location: &str, label: &str, description: &str, path: &str, expand: Expand) -> Self {
        Self {
            location: location.to_string(),
            label: Some(label.to_string()),
            icon: Some(GOOGLE_DRIVE_ICON.to_string()),
            description: Some(description.to_string()),
            hint: None,
            submit: Some(FormSubmit {
                path: path.to_string(),
                expand,
            }),
            bindings: Vec::new(),
        }
    }
}

fn connect_binding() -> Binding {
    Binding::call(
        "connect",
        "connect",
        "Connect your Google account",
        CONNECT_SUBMIT_PATH,
        Expand {
            oauth2_app: Some(ExpandLevel::All),
            oauth2_user: Some(ExpandLevel::All),
            ..Default::default()
        },
    )
}

fn disconnect_binding() -> Binding {
    Binding::call(
        "disconnect",
        "disconnect",
        "Disconnect your Google account",
        DISCONNECT_SUBMIT_PATH,
        Expand {
            app: Some(ExpandLevel::All),
            acting_user: Some(ExpandLevel::Summary),
            acting_user_access_token: Some(ExpandLevel::All),
            oauth2_user: Some(ExpandLevel::All),
            ..Default::default()
        },
    )
}

fn help_binding() -> Binding {
    Binding::call(
        "help",
        "help",
        "Show Google Drive help",
        HELP_PATH,
        Expand {
            acting_user: Some(ExpandLevel::Summary),
            ..Default::default()
        },
    )
}

fn configure_binding() -> Binding {
    Binding::call(
        "configure",
        "configure",
        "Configure the Google OAuth2 client",
        CONFIGURE_FORM_PATH,
        Expand {
            acting_user: Some(ExpandLevel::Summary),
            oauth2_app: Some(ExpandLevel::All),
            ..Default::default()
        },
    )
}

fn upload_binding() -> Binding {
    Binding::call(
        "upload-file",
        UPLOAD_MENU_LABEL,
        "Save this post's attachments to Google Drive",
        SAVE_FILE_CALL_PATH,
        Expand {
            acting_user_access_token: Some(ExpandLevel::All),
            post: Some(ExpandLevel::Summary),
            ..Default::default()
        },
    )
}

/// Bindings for the acting user.
pub fn app_bindings(context: &CallContext) -> Vec<Binding> {
    let connected = context.is_connected();
    let is_admin = context
        .acting_user
        .as_ref()
        .map(|u| u.is_system_admin())
        .unwrap_or(false);

    let mut commands = vec![if connected {
        disconnect_binding()
    } else {
        connect_binding()
    }];
    commands.push(help_binding());
    if is_admin {
        commands.push(configure_binding());
    }

    let hint = commands
        .iter()
        .map(|b| b.location.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    let drive = Binding {
        location: COMMAND_TRIGGER.to_string(),
        label: Some(COMMAND_TRIGGER.to_string()),
        icon: Some(GOOGLE_DRIVE_ICON.to_string()),
        description: Some("Manage Google Drive".to_string()),
        hint: Some(format!("[{}]", hint)),
        submit: None,
        bindings: commands,
    };

    let mut bindings = vec![Binding::location("/command", vec![drive])];
    if connected {
        bindings.push(Binding::location("/post_menu", vec![upload_binding()]));
    }
    bindings
}
