//! Session tokens.
//!
//! A successful registration or login is answered with an HS256-signed JWT carrying the user's id and login. Clients
//! present it on subsequent requests either in an `Authorization: Bearer <token>` header or in the `token` cookie.
//! Handlers that take a [`JwtClaims`] argument are thereby authenticated: the extractor rejects requests without a
//! valid, unexpired token with `401 Unauthorized`.
use actix_web::{
    cookie::{time, Cookie, SameSite},
    dev::Payload,
    http::header::AUTHORIZATION,
    web,
    FromRequest,
    HttpRequest,
};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::*;
use loyalty_engine::AuthenticatedUser;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub login: String,
}

impl From<AuthenticatedUser> for JwtClaims {
    fn from(user: AuthenticatedUser) -> Self {
        Self { user_id: user.user_id, login: user.login }
    }
}

pub struct TokenIssuer {
    key: Hs256Key,
    expiry: chrono::Duration,
    secure_cookies: bool,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, expiry: config.token_expiry, secure_cookies: config.secure_cookies }
    }

    /// Issue a new access token for a user whose credentials have already been checked.
    pub fn issue_token(&self, claims: JwtClaims) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), self.expiry);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }

    /// Checks the token's signature and expiry and returns its claims.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        Ok(token.claims().custom.clone())
    }

    /// The cookie that carries `token` back to browsers.
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, token.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(time::Duration::seconds(self.expiry.num_seconds()))
            .finish()
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::ConfigurationError("No token issuer has been configured".into()))?;
    let token = bearer_token(req)
        .or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate(&token).map_err(|e| {
        debug!("🔑️ Rejected access token. {e}");
        e
    })?;
    trace!("🔑️ Request authenticated for user #{}", claims.user_id);
    Ok(claims)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}
