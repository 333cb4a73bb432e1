//! Authentication extractors.
//!
//! Pages that need a signed-in user take an [`Identity`]. When the bearer token
//! is missing or invalid the request is answered with a redirect to the login
//! page, carrying the original path in `next`.

use std::fmt;
use std::future::{Ready, ready};

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, http::StatusCode,
    http::header, web,
};
use url::form_urlencoded::Serializer;
use uuid::Uuid;

use inkwell_core::ports::{AuthError, TokenClaims};

use crate::config::DEFAULT_LOGIN_URL;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// ```ignore
/// async fn follow_index(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

/// Redirect to the login page, returned when authentication fails.
#[derive(Debug)]
pub struct LoginRedirect {
    pub reason: AuthError,
    pub location: String,
}

impl LoginRedirect {
    fn new(req: &HttpRequest, login_url: &str, reason: AuthError) -> Self {
        let next = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.path().to_string(), |pq| pq.as_str().to_string());
        let query = Serializer::new(String::new())
            .append_pair("next", &next)
            .finish();

        tracing::debug!(path = %next, reason = %reason, "Redirecting to login");

        Self {
            reason,
            location: format!("{login_url}?{query}"),
        }
    }
}

impl fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login required: {}", self.reason)
    }
}

impl ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location.as_str()))
            .finish()
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, (AuthError, &str)> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err((
            AuthError::InvalidToken("Server configuration error".to_string()),
            DEFAULT_LOGIN_URL,
        ));
    };

    bearer_token(req)
        .and_then(|token| state.tokens.validate_token(token))
        .map(Identity::from)
        .map_err(|reason| (reason, state.login_url.as_str()))
}

impl FromRequest for Identity {
    type Error = LoginRedirect;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            authenticate(req)
                .map_err(|(reason, login_url)| LoginRedirect::new(req, login_url, reason)),
        )
    }
}

/// Identity extractor that never fails; anonymous requests yield `None`.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}
