use crate::{auth::verify_jwt, error::AppError, state::AppState};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};

/// Resolves the bearer token to an integer user id and stores it as an
/// [`AuthUser`] request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    let claims = verify_jwt(token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;

    req.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(req).await)
}

// Extractor for getting user_id from request extensions
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))
    }
}
