// =============================================================================
// APP ROUTER
// =============================================================================
//
// axum router for every path the manifest and bindings point at.
//
// Calls are `POST`ed JSON (`CallRequest`). The `Call` extractor parses the body
// and, when a secret is configured, verifies the JWT before any handler runs.
// Handlers return `Result<CallResponse, AppError>` and `responses::render`
// turns that into the HTTP response.

use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app_config::AppConfig;
use crate::core::call::{CallRequest, CallResponse};
use crate::core::errors::AppError;
use crate::core::kv::KvStore;
use crate::core::oauth::OAuthService;
use crate::core::upload::UploadService;
use crate::mattermost::bindings::app_bindings;
use crate::mattermost::calls::{self, configure, help, oauth, upload};
use crate::mattermost::jwt::{self, JWT_HEADER};
use crate::mattermost::manifest::manifest;
use crate::mattermost::responses::render;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: AppConfig,
    pub oauth: OAuthService,
    pub upload: UploadService,
    pub kv: Arc<dyn KvStore>,
}

/// A parsed, authenticated call.
pub struct Call(pub CallRequest);

impl FromRequest<Arc<AppState>> for Call {
    type Rejection = Response;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        let header = req
            .headers()
            .get(JWT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let Json(call) = Json::<CallRequest>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if let Some(secret) = state.config.app_secret.as_deref() {
            jwt::verify(secret, header.as_deref(), &call.context)
                .map_err(|e| render(&path, Err(e)))?;
        }

        tracing::debug!(
            path = %path,
            acting_user = call.context.acting_user.as_ref().map(|u| u.id.as_str()).unwrap_or("-"),
            "Handling call"
        );
        Ok(Call(call))
    }
}

async fn get_manifest(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(manifest(&state.config))
}

async fn bindings(Call(call): Call) -> Response {
    let bindings = app_bindings(&call.context);
    let data = serde_json::to_value(bindings)
        .map_err(|e| AppError::text(format!("Failed to encode bindings: {}", e)));
    render(calls::BINDINGS_PATH, data.map(CallResponse::data))
}

async fn install(Call(_call): Call) -> Response {
    render(calls::INSTALL_PATH, Ok(help::install()))
}

async fn show_help(Call(call): Call) -> Response {
    render(calls::HELP_PATH, Ok(help::help(&call.context)))
}

async fn configure_form(Call(call): Call) -> Response {
    render(calls::CONFIGURE_FORM_PATH, configure::configure_form(&call))
}

async fn configure_submit(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(
        calls::CONFIGURE_SUBMIT_PATH,
        configure::configure_submit(&state, &call).await,
    )
}

async fn connect_submit(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(calls::CONNECT_SUBMIT_PATH, oauth::connect(&state, &call).await)
}

async fn disconnect_submit(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(
        calls::DISCONNECT_SUBMIT_PATH,
        oauth::disconnect(&state, &call).await,
    )
}

async fn oauth2_connect(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(
        calls::OAUTH2_CONNECT_PATH,
        oauth::oauth2_connect(&state, &call).await,
    )
}

async fn oauth2_complete(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(
        calls::OAUTH2_COMPLETE_PATH,
        oauth::oauth2_complete(&state, &call).await,
    )
}

async fn save_file_call(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(
        calls::SAVE_FILE_CALL_PATH,
        upload::save_file_form(&state, &call).await,
    )
}

async fn save_file_submit(State(state): State<Arc<AppState>>, Call(call): Call) -> Response {
    render(
        calls::SAVE_FILE_SUBMIT_PATH,
        upload::save_file_submit(&state, &call).await,
    )
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/manifest.json", get(get_manifest))
        .route(calls::BINDINGS_PATH, post(bindings))
        .route(calls::INSTALL_PATH, post(install))
        .route(calls::HELP_PATH, post(show_help))
        .route(calls::CONFIGURE_FORM_PATH, post(configure_form))
        .route(calls::CONFIGURE_SUBMIT_PATH, post(configure_submit))
        .route(calls::CONNECT_SUBMIT_PATH, post(connect_submit))
        .route(calls::DISCONNECT_SUBMIT_PATH, post(disconnect_submit))
        .route(calls::OAUTH2_CONNECT_PATH, post(oauth2_connect))
        .route(calls::OAUTH2_COMPLETE_PATH, post(oauth2_complete))
        .route(calls::SAVE_FILE_CALL_PATH, post(save_file_call))
        .route(calls::SAVE_FILE_SUBMIT_PATH, post(save_file_submit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oauth::oauth_service::{DISCONNECTED_MESSAGE, NO_SESSION_MESSAGE};
    use crate::core::test_support::{
        call_context, FakeGoogle, FakeMattermost, BOT_TOKEN, SITE_URL, USER_ID,
    };
    use crate::infra::kv::InMemoryKvStore;
    use crate::mattermost::jwt::tests::token;
    use serde_json::{json, Value};

    struct TestApp {
        base: String,
        kv: Arc<InMemoryKvStore>,
        mattermost: Arc<FakeMattermost>,
        http: reqwest::Client,
    }

    async fn spawn(secret: Option<&str>) -> TestApp {
        let google = Arc::new(FakeGoogle::new());
        let mattermost =
            Arc::new(FakeMattermost::new().with_post("p1", &[("f1", "notes.txt", "text/plain")]));
        let kv = Arc::new(InMemoryKvStore::new());

        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.app_secret = secret.map(str::to_string);

        let state = Arc::new(AppState {
            config,
            oauth: OAuthService::new(google.clone(), mattermost.clone(), kv.clone()),
            upload: UploadService::new(google, mattermost.clone()),
            kv: kv.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        TestApp {
            base: format!("http://{}", addr),
            kv,
            mattermost,
            http: reqwest::Client::new(),
        }
    }

    fn call(path: &str, connected: bool, values: Value) -> Value {
        let mut call = serde_json::to_value(CallRequest {
            path: Some(path.to_string()),
            context: call_context(connected),
            ..Default::default()
        })
        .unwrap();
        call["values"] = values;
        call
    }

    impl TestApp {
        async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
            let response = self
                .http
                .post(format!("{}{}", self.base, path))
                .json(body)
                .send()
                .await
                .unwrap();
            let status = response.status().as_u16();
            (status, response.json().await.unwrap())
        }
    }

    #[tokio::test]
    async fn serves_the_manifest() {
        let app = spawn(None).await;
        let manifest: Value = app
            .http
            .get(format!("{}/manifest.json", app.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(manifest["app_id"], "google-drive");
    }

    #[tokio::test]
    async fn connect_returns_the_link_for_disconnected_users() {
        let app = spawn(None).await;
        let (status, body) = app
            .post(calls::CONNECT_SUBMIT_PATH, &call(calls::CONNECT_SUBMIT_PATH, false, json!({})))
            .await;

        assert_eq!(status, 200);
        assert_eq!(body["type"], "ok");
        assert!(body["text"].as_str().unwrap().starts_with("Follow this [link]("));
    }

    #[tokio::test]
    async fn oauth2_connect_returns_the_url_as_data() {
        let app = spawn(None).await;
        let (_, body) = app
            .post(
                calls::OAUTH2_CONNECT_PATH,
                &call(calls::OAUTH2_CONNECT_PATH, false, json!({ "state": "st-1" })),
            )
            .await;

        assert_eq!(body["type"], "ok");
        let url = body["data"].as_str().unwrap();
        assert!(url.contains("state=st-1"));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn oauth2_complete_without_code_is_an_error_response() {
        let app = spawn(None).await;
        let (status, body) = app
            .post(calls::OAUTH2_COMPLETE_PATH, &call(calls::OAUTH2_COMPLETE_PATH, false, json!({})))
            .await;

        assert_eq!(status, 200);
        assert_eq!(body["type"], "error");
        assert_eq!(body["text"], "Bad Request: code param not provided");
    }

    #[tokio::test]
    async fn complete_then_disconnect_round_trip() {
        let app = spawn(None).await;

        let (_, body) = app
            .post(
                calls::OAUTH2_COMPLETE_PATH,
                &call(calls::OAUTH2_COMPLETE_PATH, false, json!({ "code": "4/abc" })),
            )
            .await;
        assert_eq!(body["type"], "ok");
        assert_eq!(
            app.kv.raw(BOT_TOKEN, "google_data").unwrap()["userData"][0][USER_ID]["user_email"],
            "alice@example.com"
        );

        let (_, body) = app
            .post(calls::DISCONNECT_SUBMIT_PATH, &call(calls::DISCONNECT_SUBMIT_PATH, true, json!({})))
            .await;
        assert_eq!(body["type"], "ok");
        assert_eq!(body["text"], DISCONNECTED_MESSAGE);
        assert_eq!(app.kv.raw(BOT_TOKEN, "google_data").unwrap(), json!({ "userData": [] }));
        assert_eq!(app.mattermost.dm_messages().len(), 2);
    }

    #[tokio::test]
    async fn disconnect_without_session_renders_markdown_as_ok() {
        let app = spawn(None).await;
        let (_, body) = app
            .post(calls::DISCONNECT_SUBMIT_PATH, &call(calls::DISCONNECT_SUBMIT_PATH, false, json!({})))
            .await;

        assert_eq!(body["type"], "ok");
        assert_eq!(body["text"], NO_SESSION_MESSAGE);
        assert_eq!(app.kv.call_count(), 0);
    }

    #[tokio::test]
    async fn save_file_flow_returns_a_form_then_a_report() {
        let app = spawn(None).await;

        let (_, body) = app
            .post(calls::SAVE_FILE_CALL_PATH, &call(calls::SAVE_FILE_CALL_PATH, true, json!({})))
            .await;
        assert_eq!(body["type"], "form");
        assert_eq!(body["form"]["submit"]["path"], calls::SAVE_FILE_SUBMIT_PATH);

        let (_, body) = app
            .post(calls::SAVE_FILE_SUBMIT_PATH, &call(calls::SAVE_FILE_SUBMIT_PATH, true, json!({})))
            .await;
        assert_eq!(body["type"], "ok");
        assert!(body["text"]
            .as_str()
            .unwrap()
            .contains("[notes.txt](https://drive.google.com/file/d/drive-1/view)"));
    }

    #[tokio::test]
    async fn bindings_follow_connection_state() {
        let app = spawn(None).await;
        let (_, body) = app
            .post(calls::BINDINGS_PATH, &call(calls::BINDINGS_PATH, true, json!({})))
            .await;

        assert_eq!(body["type"], "ok");
        assert_eq!(body["data"][0]["bindings"][0]["bindings"][0]["location"], "disconnect");
        assert_eq!(body["data"][1]["location"], "/post_menu");
    }

    #[tokio::test]
    async fn configure_submit_stores_the_client_for_admins_only() {
        let app = spawn(None).await;
        let values = json!({ "client_id": "new-id", "client_secret": "new-secret" });

        let (_, body) = app
            .post(calls::CONFIGURE_SUBMIT_PATH, &call(calls::CONFIGURE_SUBMIT_PATH, false, values.clone()))
            .await;
        assert_eq!(body["type"], "ok");
        assert_eq!(body["text"], configure::NOT_ADMIN_MESSAGE);
        assert_eq!(app.kv.oauth2_app(SITE_URL), None);

        let mut admin = call(calls::CONFIGURE_SUBMIT_PATH, false, values);
        admin["context"]["acting_user"]["roles"] = json!("system_user system_admin");
        let (_, body) = app.post(calls::CONFIGURE_SUBMIT_PATH, &admin).await;

        assert_eq!(body["text"], configure::CONFIGURED_MESSAGE);
        let stored = app.kv.oauth2_app(SITE_URL).unwrap();
        assert_eq!(stored.client_id, "new-id");
        assert_eq!(stored.client_secret, "new-secret");
    }

    #[tokio::test]
    async fn jwt_is_enforced_when_a_secret_is_configured() {
        let app = spawn(Some("shh")).await;
        let body = call(calls::HELP_PATH, false, json!({}));

        let (status, rejected) = app.post(calls::HELP_PATH, &body).await;
        assert_eq!(status, 401);
        assert_eq!(rejected["type"], "error");

        let response = app
            .http
            .post(format!("{}{}", app.base, calls::HELP_PATH))
            .header(JWT_HEADER, format!("Bearer {}", token("shh", USER_ID)))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
