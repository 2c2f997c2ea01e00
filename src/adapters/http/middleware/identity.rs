//! Caller identity for the channel-grant endpoint.
//!
//! The server sits behind an authenticating proxy that forwards the user
//! in trusted headers. `identity_middleware` lifts them into request
//! extensions and [`RequireAuth`] reads them back in handlers.
//!
//! ```text
//! Request → identity_middleware → injects AuthenticatedUser into extensions
//!                                        ↓
//!                                Handler → RequireAuth extractor reads from extensions
//! ```

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::adapters::http::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The user on whose behalf a request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: Option<String>,
}

impl AuthenticatedUser {
    /// Display name, falling back to `User <id>`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("User {}", self.id))
    }
}

/// Injects the forwarded user, if any. Requests without one continue
/// unauthenticated; handlers decide whether that is acceptable.
pub async fn identity_middleware(mut request: Request, next: Next) -> Response {
    if let Some(user) = forwarded_user(request.headers()) {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// Reads the trusted identity headers. Blank values count as absent.
pub fn forwarded_user(headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    header(USER_ID_HEADER).map(|id| AuthenticatedUser {
        id,
        name: header(USER_NAME_HEADER),
    })
}

/// Extractor that requires an authenticated user.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or_else(|| ApiError::Forbidden("Unauthorized".to_string()).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn reads_id_and_optional_name() {
        let user = forwarded_user(&headers(&[(USER_ID_HEADER, "7"), (USER_NAME_HEADER, "Ann")]));
        assert_eq!(
            user,
            Some(AuthenticatedUser {
                id: "7".to_string(),
                name: Some("Ann".to_string()),
            })
        );
        assert_eq!(
            forwarded_user(&headers(&[(USER_ID_HEADER, "7")])).unwrap().display_name(),
            "User 7"
        );
    }

    #[test]
    fn blank_id_is_no_user() {
        assert_eq!(forwarded_user(&headers(&[(USER_ID_HEADER, "  ")])), None);
        assert_eq!(forwarded_user(&HeaderMap::new()), None);
    }

    async fn whoami(RequireAuth(user): RequireAuth) -> String {
        user.display_name()
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn(identity_middleware))
    }

    #[tokio::test]
    async fn middleware_feeds_the_extractor() {
        let request = axum::http::Request::builder()
            .uri("/whoami")
            .header(USER_ID_HEADER, "7")
            .header(USER_NAME_HEADER, "Ann")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Ann");
    }

    #[tokio::test]
    async fn missing_user_is_forbidden() {
        let request = axum::http::Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
