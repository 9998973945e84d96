// Verification of the JWT Mattermost attaches to every call when the app is
// installed with a shared secret.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::core::call::CallContext;
use crate::core::errors::AppError;

pub const JWT_HEADER: &str = "Mattermost-App-Authorization";

#[derive(Debug, Deserialize)]
struct CallClaims {
    #[serde(default)]
    acting_user_id: Option<String>,
}

/// Pulls the token out of a `Bearer <jwt>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", JWT_HEADER)))
}

/// Checks the HS256 signature and expiry, and that the token was issued for
/// the acting user of this call.
pub fn verify(secret: &str, header: Option<&str>, context: &CallContext) -> Result<(), AppError> {
    let token = bearer_token(header)?;

    let data = decode::<CallClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?;

    if let Some(claimed) = data.claims.acting_user_id.as_deref() {
        let actual = context.acting_user.as_ref().map(|u| u.id.as_str());
        if actual != Some(claimed) {
            return Err(AppError::Unauthorized(
                "token was issued for a different user".to_string(),
            ));
        }
    }

    Ok(())
}
