//! Credential validation and request identity.

pub mod ownership;

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::ApiError;

// The single recognized account. A production deployment would hold
// credentials in a real store and hand out tokens instead.
const STORED_USERNAME: &str = "default_user";
const STORED_HASH: &str = "$2a$10$P7GoVlD0fEu14OWE76dGzude2NLw0pi05Gzar6rm1b.oD04lcvyaq";

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password_hash: String,
}

impl Credentials {
    pub fn stored() -> Self {
        Self {
            username: STORED_USERNAME.to_string(),
            password_hash: STORED_HASH.to_string(),
        }
    }
}

/// Identity the authentication middleware attaches to the request; handlers
/// receive it as an extractor.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}

/// Pull `(username, password)` out of a basic-auth header value.
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Check a credential pair against the stored account. The bcrypt
/// comparison is CPU-bound, so it runs on the blocking pool.
pub async fn validate(credentials: &Credentials, username: &str, password: &str) -> bool {
    if username != credentials.username {
        return false;
    }
    let password = password.to_string();
    let hash = credentials.password_hash.clone();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}
