pub mod oauth_service;

pub use oauth_service::OAuthService;
