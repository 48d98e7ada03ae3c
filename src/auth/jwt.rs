//! Signed bearer tokens
//!
//! Tokens are HS256 JWTs in compact three-part form. They are stateless: any
//! holder of the signing secret can verify one, and validity depends only on
//! the signature and the `exp` claim.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 300;

/// Longest accepted token lifetime (30 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the verified identity's username
    pub sub: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch), always `iat + ttl`
    pub exp: i64,
}

/// Issues and verifies tokens with a process-wide symmetric secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from injected key material
    ///
    /// `ttl_secs` is capped at [`MAX_TOKEN_TTL_SECS`].
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        let ttl_secs = ttl_secs.min(MAX_TOKEN_TTL_SECS);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            // Capped above, so the conversion cannot overflow
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Issue a token for `subject` valid from now
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token for `subject` as if issued at `issued_at`
    pub fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims
    ///
    /// No leeway is applied: a token is expired at any instant after `exp`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}
