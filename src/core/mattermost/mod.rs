pub mod mattermost_client;

pub use mattermost_client::{FileInfo, MattermostApi, MattermostAuth, MattermostError, Post};
