//! HS256 bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{AuthUser, Result, Role, TokenService};

use crate::error::AuthAdapterError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    username: String,
    role: Role,
    iss: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &SecretString, issuer: impl Into<String>, ttl_minutes: i64) -> Self {
        let issuer = issuer.into();
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            issuer,
            ttl: Duration::minutes(ttl_minutes),
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &AuthUser) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.user_id,
            username: user.username.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthAdapterError::Sign(e.to_string()))?;
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthAdapterError::Rejected(e.to_string()))?;
        Ok(AuthUser {
            user_id: data.claims.sub,
            username: data.claims.username,
            role: data.claims.role,
        })
    }
}
