use serde_json::{json, Value};

use crate::app_config::AppConfig;
use crate::core::call::{Expand, ExpandLevel, FormSubmit};
use crate::core::upload::upload_service::GOOGLE_DRIVE_ICON;
use crate::mattermost::calls::{
    BINDINGS_PATH, INSTALL_PATH, OAUTH2_COMPLETE_PATH, OAUTH2_CONNECT_PATH,
};

pub const APP_ID: &str = "google-drive";

fn call(path: &str, expand: Expand) -> FormSubmit {
    FormSubmit {
        path: path.to_string(),
        expand,
    }
}

/// The manifest Mattermost reads when the app is installed over HTTP.
pub fn manifest(config: &AppConfig) -> Value {
    json!({
        "app_id": APP_ID,
        "version": env!("CARGO_PKG_VERSION"),
        "display_name": "Google Drive",
        "description": "Connect your Google account and save post attachments to Google Drive",
        "homepage_url": config.root_url,
        "icon": GOOGLE_DRIVE_ICON,
        "requested_permissions": ["act_as_bot", "act_as_user", "remote_oauth2"],
        "requested_locations": ["/command", "/post_menu"],
        "bindings": call(BINDINGS_PATH, Expand {
            acting_user: Some(ExpandLevel::Summary),
            oauth2_app: Some(ExpandLevel::Summary),
            oauth2_user: Some(ExpandLevel::All),
            ..Default::default()
        }),
        "on_install": call(INSTALL_PATH, Expand {
            app: Some(ExpandLevel::Summary),
            acting_user: Some(ExpandLevel::Summary),
            ..Default::default()
        }),
        "remote_oauth2": {
            "connect": call(OAUTH2_CONNECT_PATH, Expand {
                oauth2_app: Some(ExpandLevel::All),
                ..Default::default()
            }),
            "complete": call(OAUTH2_COMPLETE_PATH, Expand {
                app: Some(ExpandLevel::All),
                acting_user: Some(ExpandLevel::Summary),
                acting_user_access_token: Some(ExpandLevel::All),
                oauth2_app: Some(ExpandLevel::All),
                ..Default::default()
            }),
        },
        "http": {
            "root_url": config.root_url,
            "use_jwt": config.app_secret.is_some(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: Option<&str>) -> AppConfig {
        let mut config = AppConfig::from_lookup(|name| match name {
            "APP_URL" => Some("https://drive-app.example.com".to_string()),
            _ => None,
        })
        .unwrap();
        config.app_secret = secret.map(str::to_string);
        config
    }

    #[test]
    fn manifest_points_mattermost_at_our_routes() {
        let manifest = manifest(&config(None));

        assert_eq!(manifest["app_id"], APP_ID);
        assert_eq!(manifest["http"]["root_url"], "https://drive-app.example.com");
        assert_eq!(manifest["http"]["use_jwt"], false);
        assert_eq!(manifest["bindings"]["path"], BINDINGS_PATH);
        assert_eq!(manifest["remote_oauth2"]["connect"]["path"], OAUTH2_CONNECT_PATH);
        assert_eq!(
            manifest["remote_oauth2"]["complete"]["expand"]["acting_user_access_token"],
            "all"
        );
    }

    #[test]
    fn manifest_requests_jwt_when_a_secret_is_set() {
        assert_eq!(manifest(&config(Some("shh")))["http"]["use_jwt"], true);
    }
}
