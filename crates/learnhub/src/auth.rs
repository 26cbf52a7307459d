//! Bearer-token verification for the API surface.
//!
//! Tokens are issued elsewhere; this module only validates HS256 JWTs and
//! exposes the caller's claims to handlers through request extensions.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::domain::UserId;
use crate::http;

const TOKEN_COOKIE: &str = "token";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiry as a unix timestamp; checked when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Validates tokens against the shared HS256 secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;

        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret)
    }

    pub fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        decode::<AuthClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(err.to_string()),
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no bearer token supplied")]
    MissingToken,
    #[error("authorization header is not a bearer token")]
    MalformedHeader,
    #[error("token has expired")]
    Expired,
    #[error("token rejected: {0}")]
    Invalid(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        debug!(reason = %self, "request rejected by bearer auth");
        http::failure(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

/// Pulls the token from `Authorization: Bearer ...`, falling back to the
/// `token` cookie when the header is absent.
pub fn token_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedHeader);
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Rejects the request with 401 unless it carries a valid token; otherwise
/// inserts [`AuthClaims`] into the request extensions.
pub async fn require_bearer(
    State(verifier): State<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = verifier.verify(token_from_headers(request.headers())?)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Wraps every route currently in `router` with [`require_bearer`].
pub fn with_bearer_auth(router: Router, verifier: TokenVerifier) -> Router {
    router.layer(middleware::from_fn_with_state(verifier, require_bearer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request as HttpRequest};
    use axum::routing::get;
    use axum::Extension;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    const SECRET: &str = "unit-test-secret";

    fn token(claims: &AuthClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token encodes")
    }

    fn claims(exp: Option<u64>) -> AuthClaims {
        AuthClaims {
            user_id: UserId::new(),
            email: Some("ada@example.com".to_string()),
            role: Some("employee".to_string()),
            name: Some("Ada Park".to_string()),
            exp,
        }
    }

    fn in_one_hour() -> u64 {
        (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as u64
    }

    #[test]
    fn verifies_signed_token_and_reads_user_id() {
        let verifier = TokenVerifier::new(SECRET);
        let expected = claims(Some(in_one_hour()));
        let verified = verifier
            .verify(&token(&expected, SECRET))
            .expect("token verifies");
        assert_eq!(verified, expected);
    }

    #[test]
    fn token_without_expiry_is_accepted() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(verifier.verify(&token(&claims(None), SECRET)).is_ok());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(matches!(
            verifier.verify(&token(&claims(Some(in_one_hour())), "other-secret")),
            Err(AuthError::Invalid(_))
        ));
        assert!(matches!(
            verifier.verify(&token(&claims(Some(1_000)), SECRET)),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn extracts_token_from_header_or_cookie() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            token_from_headers(&headers),
            Err(AuthError::MissingToken)
        ));

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=abc"));
        assert_eq!(token_from_headers(&headers).expect("cookie token"), "abc");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers).expect("bearer token"), "xyz");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(matches!(
            token_from_headers(&headers),
            Err(AuthError::MalformedHeader)
        ));
    }

    #[tokio::test]
    async fn middleware_gates_routes_and_exposes_claims() {
        let router = with_bearer_auth(
            Router::new().route(
                "/whoami",
                get(|Extension(claims): Extension<AuthClaims>| async move {
                    claims.user_id.to_string()
                }),
            ),
            TokenVerifier::new(SECRET),
        );

        let rejected = router
            .clone()
            .oneshot(
                HttpRequest::get("/whoami")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

        let caller = claims(Some(in_one_hour()));
        let accepted = router
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", token(&caller, SECRET)))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(accepted.status(), StatusCode::OK);
    }
}
