// Google infra layer.
// - `google_api_client.rs` talks to Google's OAuth2 and Drive HTTP APIs.

#[path = "google_api_client.rs"]
pub mod google_api_client;

pub use google_api_client::{GoogleApiClient, GoogleEndpoints};
