//! JWT token service. Tokens carry the id, username and roles of the caller;
//! the blog reads them to know who is asking.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkwell_core::ports::{AuthError, TokenClaims, TokenService};

const DEV_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "inkwell".to_string(),
        }
    }
}

/// Wire format of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    #[serde(default)]
    roles: Vec<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        if config.secret == DEV_SECRET {
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }

        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let user_id =
            Uuid::parse_str(&data.claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            username: data.claims.username,
            roles: data.claims.roles,
            exp: data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(issuer: &str, expiration_hours: i64) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours,
            issuer: issuer.to_string(),
        })
    }

    #[test]
    fn test_token_round_trips_identity() {
        let service = service("test-issuer", 1);
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(user_id, "leo", vec!["admin".to_string()])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "leo");
        assert_eq!(claims.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let result = service("test-issuer", 1).validate_token("not-a-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service("test-issuer", -2);
        let token = service.generate_token(Uuid::new_v4(), "leo", vec![]).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let token = service("issuer1", 1)
            .generate_token(Uuid::new_v4(), "leo", vec![])
            .unwrap();

        assert!(service("issuer2", 1).validate_token(&token).is_err());
    }

    #[test]
    fn test_expiration_seconds() {
        assert_eq!(service("test", 24).expiration_seconds(), 86400);
    }
}
