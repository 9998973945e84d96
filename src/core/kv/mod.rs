pub mod kv_models;
pub mod kv_store;

pub use kv_models::{OAuth2AppCredentials, OAuthUserRecord};
pub use kv_store::{load_directory, save_directory, KvStore, StoreError};
