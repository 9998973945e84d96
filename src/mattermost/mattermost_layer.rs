// Mattermost layer - the HTTP surface the Apps framework calls into.
//
// `app_router.rs` owns the axum router and shared state. Everything else here
// turns Mattermost's call model into service calls and back.

pub mod app_router;

pub mod bindings;

#[path = "calls/call_catalog.rs"]
pub mod calls;

pub mod jwt;

pub mod manifest;

pub mod responses;

pub use app_router::{router, AppState};
