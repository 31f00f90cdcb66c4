use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::gateway::state::AppState;
use crate::models::User;

/// Authenticated caller, injected into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Extract the token from `Authorization: Bearer <token>`.
///
/// `Ok(None)` when the header is absent; `Err` when it is present but malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ServiceError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ServiceError::Auth("Invalid token format".into()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(ServiceError::Auth("Invalid token format".into())),
    }
}

/// Reject the request unless it carries a valid bearer token
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers())?
        .ok_or_else(|| ServiceError::Auth("Missing Authorization header".into()))?;
    let user = state.user_auth.authenticate(token).await?;
    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// Attach the caller when a valid token is present; guests pass through
pub async fn optional_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).ok().flatten().map(str::to_owned);
    if let Some(token) = token {
        match state.user_auth.authenticate(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(AuthUser(user));
            }
            Err(e) => tracing::debug!("Ignoring invalid token on optional route: {}", e),
        }
    }
    next.run(request).await
}

/// Must run after [`jwt_auth_middleware`]
pub async fn admin_middleware(request: Request<Body>, next: Next) -> Result<Response, ServiceError> {
    match request.extensions().get::<AuthUser>() {
        Some(AuthUser(user)) if user.is_admin() => Ok(next.run(request).await),
        Some(_) => Err(ServiceError::Forbidden("Admin access required".into())),
        None => Err(ServiceError::Auth("Unauthorized".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers).unwrap(), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }
}
