// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "google/mod.rs"]
pub mod google;

#[path = "mattermost/mod.rs"]
pub mod mattermost;

#[cfg(test)]
#[path = "kv/mod.rs"]
pub mod kv;
