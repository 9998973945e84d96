// The core module contains all business logic.
// Each feature gets its own submodule; the HTTP and Mattermost wiring lives elsewhere.

#[path = "call/mod.rs"]
pub mod call;

pub mod errors;

#[path = "google/mod.rs"]
pub mod google;

#[path = "mattermost/mod.rs"]
pub mod mattermost;

#[path = "kv/mod.rs"]
pub mod kv;

pub mod markdown;

#[path = "oauth/mod.rs"]
pub mod oauth;

#[path = "upload/mod.rs"]
pub mod upload;

#[cfg(test)]
pub mod test_support;
