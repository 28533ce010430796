use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use millwork_core::{CoreResult, Permission, Role};

use crate::{error::AppError, state::AppState};

/// Claims of a session token minted by the auth backend
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
}

impl UserClaims {
    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        self.role.require(permission)
    }
}

/// Verifies the bearer token and injects [`UserClaims`] into the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::AuthenticationError("Invalid or expired token".to_string())
    })?;

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
