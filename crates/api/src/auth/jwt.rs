//! Bearer token validation for tokens issued by the external identity
//! provider.
//!
//! Production deployments verify RS256 signatures with the realm public
//! key. HS256 with a shared secret is accepted for development and tests.
//! The server never issues tokens itself.

use std::fmt;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Roles granted by the identity provider's realm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims read from an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject -- the provider's user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// How tokens are verified.
#[derive(Clone)]
pub struct JwtConfig {
    key: DecodingKey,
    algorithm: Algorithm,
    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,
    /// Expected `aud` claim, if any.
    pub audience: Option<String>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    /// Verify HS256 tokens with a shared secret.
    pub fn hs256(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            issuer: None,
            audience: None,
        }
    }

    /// Verify RS256 tokens with a public key.
    ///
    /// Accepts a PEM document or the bare base64 body some providers show
    /// in their admin console.
    pub fn rs256(public_key: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let pem = if public_key.contains("-----BEGIN") {
            public_key.to_string()
        } else {
            format!(
                "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
                public_key.trim()
            )
        };
        Ok(Self {
            key: DecodingKey::from_rsa_pem(pem.as_bytes())?,
            algorithm: Algorithm::RS256,
            issuer: None,
            audience: None,
        })
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var          | Required                      |
    /// |------------------|-------------------------------|
    /// | `JWT_PUBLIC_KEY` | one of the two (RS256)        |
    /// | `JWT_SECRET`     | one of the two (HS256)        |
    /// | `JWT_ISSUER`     | no                            |
    /// | `JWT_AUDIENCE`   | no                            |
    ///
    /// # Panics
    ///
    /// Panics if neither key is set or the public key cannot be parsed.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let config = match (non_empty("JWT_PUBLIC_KEY"), non_empty("JWT_SECRET")) {
            (Some(public_key), _) => {
                Self::rs256(&public_key).expect("JWT_PUBLIC_KEY must be a valid RSA public key")
            }
            (None, Some(secret)) => Self::hs256(&secret),
            (None, None) => panic!("JWT_PUBLIC_KEY or JWT_SECRET must be set in the environment"),
        };

        config
            .with_issuer(non_empty("JWT_ISSUER"))
            .with_audience(non_empty("JWT_AUDIENCE"))
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks the signature and expiry, plus issuer and audience when
/// configured.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(config.algorithm);
    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }
    match config.audience {
        Some(ref audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let token_data = decode::<Claims>(token, &config.key, &validation)?;
    Ok(token_data.claims)
}
