// Mattermost infra layer.
// - `mattermost_rest_client.rs` covers the REST API and the Apps KV/OAuth2 storage.

#[path = "mattermost_rest_client.rs"]
pub mod mattermost_rest_client;

pub use mattermost_rest_client::MattermostRestClient;
