pub mod google_client;

pub use google_client::{
    build_authorization_url, DriveFile, DriveUpload, GoogleApi, GoogleError, GoogleUser,
    OAuthClient, TokenSet,
};
