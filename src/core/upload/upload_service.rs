use std::sync::Arc;

use crate::core::call::{AppForm, CallContext, Expand, ExpandLevel, FormSubmit};
use crate::core::errors::AppError;
use crate::core::google::{DriveFile, DriveUpload, GoogleApi, OAuthClient};
use crate::core::markdown::{bullet_list, hyperlink};
use crate::core::mattermost::{MattermostApi, MattermostAuth, Post};

pub const SAVE_FILE_SUBMIT_PATH: &str = "/save-file/submit";
pub const GOOGLE_DRIVE_ICON: &str = "google-drive-icon.png";
pub const NO_FILES_MESSAGE: &str = "Selected post doesn't have any files to be uploaded";
pub const NOT_CONNECTED_MESSAGE: &str =
    "You need to connect your Google account first. Run `/drive connect`.";

/// Result of pushing a post's attachments to Drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub files: Vec<DriveFile>,
}

impl UploadReport {
    pub fn to_markdown(&self) -> String {
        let lines = self.files.iter().map(|f| match &f.web_view_link {
            Some(link) => hyperlink(&f.name, link),
            None => f.name.clone(),
        });
        format!(
            "Uploaded {} file(s) to Google Drive:\n{}",
            self.files.len(),
            bullet_list(lines)
        )
    }
}

pub struct UploadService {
    google: Arc<dyn GoogleApi>,
    mattermost: Arc<dyn MattermostApi>,
}

impl UploadService {
    pub fn new(google: Arc<dyn GoogleApi>, mattermost: Arc<dyn MattermostApi>) -> Self {
        Self { google, mattermost }
    }

    /// Loads the selected post with the acting user's token and insists it has files.
    async fn post_with_files(&self, context: &CallContext) -> Result<(MattermostAuth, Post), AppError> {
        let auth = MattermostAuth::new(
            context.require_site_url()?,
            context.require_acting_user_access_token()?,
        );
        let post = self
            .mattermost
            .get_post(&auth, context.require_post_id()?)
            .await?;

        if post.file_ids.is_empty() {
            return Err(AppError::markdown(NO_FILES_MESSAGE));
        }
        Ok((auth, post))
    }

    /// Asks the user to confirm the upload of the selected post's files.
    pub async fn confirmation_form(&self, context: &CallContext) -> Result<AppForm, AppError> {
        let (_, post) = self.post_with_files(context).await?;
        tracing::debug!(post_id = %post.id, files = post.file_ids.len(), "Building upload form");

        Ok(AppForm {
            title: "Upload to Google Drive".to_string(),
            header: "Do you want to upload this file to Google Drive?".to_string(),
            icon: GOOGLE_DRIVE_ICON.to_string(),
            fields: Vec::new(),
            submit: FormSubmit {
                path: SAVE_FILE_SUBMIT_PATH.to_string(),
                expand: Expand {
                    acting_user: Some(ExpandLevel::Summary),
                    acting_user_access_token: Some(ExpandLevel::All),
                    oauth2_app: Some(ExpandLevel::Summary),
                    oauth2_user: Some(ExpandLevel::Summary),
                    post: Some(ExpandLevel::Summary),
                    ..Default::default()
                },
            },
        })
    }

    /// Uploads every attachment of the confirmed post to the user's Drive.
    ///
    /// Files go up one at a time, in post order. The first failure stops the
    /// loop; files already uploaded stay in Drive.
    pub async fn submit(&self, context: &CallContext) -> Result<UploadReport, AppError> {
        let oauth2 = context.require_oauth2()?;
        let refresh_token = oauth2
            .stored_refresh_token()
            .ok_or_else(|| AppError::markdown(NOT_CONNECTED_MESSAGE))?;

        let (auth, post) = self.post_with_files(context).await?;

        let client = OAuthClient::from_app(oauth2)?;
        let access_token = self
            .google
            .refresh_access_token(&client, refresh_token)
            .await
            .map_err(AppError::google_failed)?;

        let mut files = Vec::with_capacity(post.file_ids.len());
        for file_id in &post.file_ids {
            let info = self.mattermost.get_file_info(&auth, file_id).await?;
            let bytes = self.mattermost.download_file(&auth, file_id).await?;

            let mime_type = if info.mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                info.mime_type
            };

            let uploaded = self
                .google
                .upload_file(
                    &access_token,
                    DriveUpload {
                        name: info.name,
                        mime_type,
                        bytes,
                    },
                )
                .await
                .map_err(AppError::google_failed)?;

            tracing::info!(post_id = %post.id, drive_id = %uploaded.id, "Uploaded file to Google Drive");
            files.push(uploaded);
        }

        Ok(UploadReport { files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ExceptionKind;
    use crate::core::test_support::*;

    fn service(google: FakeGoogle, mattermost: FakeMattermost) -> (Arc<FakeGoogle>, UploadService) {
        let google = Arc::new(google);
        let service = UploadService::new(google.clone(), Arc::new(mattermost));
        (google, service)
    }

    fn context_for(post_id: &str, connected: bool) -> CallContext {
        let mut context = call_context(connected);
        if let Some(post) = context.post.as_mut() {
            post.id = post_id.to_string();
        }
        context
    }

    #[tokio::test]
    async fn form_is_refused_for_posts_without_files() {
        let (_, service) = service(FakeGoogle::new(), FakeMattermost::new().with_post("p1", &[]));

        let err = service
            .confirmation_form(&context_for("p1", true))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ExceptionKind::Markdown));
        assert_eq!(
            err.to_string(),
            "Selected post doesn't have any files to be uploaded"
        );
    }

    #[tokio::test]
    async fn form_submits_to_the_save_file_route() {
        let mattermost =
            FakeMattermost::new().with_post("p1", &[("f1", "notes.txt", "text/plain")]);
        let (_, service) = service(FakeGoogle::new(), mattermost);

        let form = service
            .confirmation_form(&context_for("p1", true))
            .await
            .unwrap();

        assert_eq!(form.submit.path, "/save-file/submit");
        assert_eq!(form.title, "Upload to Google Drive");
        assert!(form.fields.is_empty());
        assert_eq!(
            form.submit.expand.acting_user_access_token,
            Some(ExpandLevel::All)
        );
        assert_eq!(form.submit.expand.post, Some(ExpandLevel::Summary));
    }

    #[tokio::test]
    async fn unknown_posts_surface_the_mattermost_error() {
        let (_, service) = service(FakeGoogle::new(), FakeMattermost::new());
        let err = service
            .confirmation_form(&context_for("missing", true))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Mattermost(_)));
    }

    #[tokio::test]
    async fn submit_uploads_every_file_in_order() {
        let mattermost = FakeMattermost::new().with_post(
            "p1",
            &[
                ("f1", "notes.txt", "text/plain"),
                ("f2", "diagram", ""),
            ],
        );
        let (google, service) = service(FakeGoogle::new(), mattermost);

        let report = service.submit(&context_for("p1", true)).await.unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(
            google.refreshed_with.lock().unwrap().as_slice(),
            ["1//stored".to_string()]
        );

        let uploads = google.uploads.lock().unwrap();
        assert_eq!(uploads[0].name, "notes.txt");
        assert_eq!(uploads[1].mime_type, "application/octet-stream");
        assert_eq!(uploads[0].bytes, b"abc".to_vec());

        let markdown = report.to_markdown();
        assert!(markdown.starts_with("Uploaded 2 file(s) to Google Drive:"));
        assert!(markdown.contains("- [notes.txt](https://drive.google.com/file/d/drive-1/view)"));
    }

    #[tokio::test]
    async fn submit_requires_a_connected_account() {
        let mattermost =
            FakeMattermost::new().with_post("p1", &[("f1", "notes.txt", "text/plain")]);
        let (google, service) = service(FakeGoogle::new(), mattermost);

        let err = service.submit(&context_for("p1", false)).await.unwrap_err();
        assert_eq!(err.kind(), Some(ExceptionKind::Markdown));
        assert!(google.refreshed_with.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_stops_at_the_first_drive_failure() {
        let mattermost = FakeMattermost::new().with_post(
            "p1",
            &[
                ("f1", "a.txt", "text/plain"),
                ("f2", "b.txt", "text/plain"),
                ("f3", "c.txt", "text/plain"),
            ],
        );
        let mut google = FakeGoogle::new();
        google.fail_upload_named = Some("b.txt".to_string());
        let (google, service) = service(google, mattermost);

        let err = service.submit(&context_for("p1", true)).await.unwrap_err();
        assert_eq!(err.kind(), Some(ExceptionKind::Text));
        assert!(err.to_string().contains("storageQuotaExceeded"));
        assert_eq!(google.uploads.lock().unwrap().len(), 1);
    }

    #[test]
    fn report_falls_back_to_plain_names_without_links() {
        let report = UploadReport {
            files: vec![DriveFile {
                id: "d1".into(),
                name: "plain.pdf".into(),
                web_view_link: None,
            }],
        };
        assert_eq!(
            report.to_markdown(),
            "Uploaded 1 file(s) to Google Drive:\n- plain.pdf"
        );
    }
}
