//! Access token handling. The client never verifies signatures (that is the
//! server's job) it only reads the claims it needs to manage the session

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use secrecy::SecretString;

use crate::time::Timestamp;

/// Tokens returned on login and refresh
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: SecretString,
    pub refresh_token: SecretString,
}

/// The subset of the access token claims used by the client
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessClaims {
    /// Login of the account the token was issued to
    pub sub: String,
    /// Expiry in seconds since the unix epoch
    pub exp: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not made up of three dot separated parts")]
    Malformed,
    #[error("token payload is not valid base64")]
    Encoding,
    #[error("token payload is not valid json: {0}")]
    Payload(String),
}

impl AccessClaims {
    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.exp)
    }
}

/// Reads the claims from the payload of a JWT
#[tracing::instrument(skip(token), err(Debug))]
pub fn decode_claims(token: &str) -> Result<AccessClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

#[cfg(any(test, feature = "expose_internal"))]
pub mod expose_internal {
    //! Builds tokens with arbitrary claims for tests. The signature part is a
    //! placeholder

    use super::*;

    pub fn make_unsigned_token(sub: &str, expires_at: Timestamp) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = AccessClaims {
            sub: sub.to_string(),
            exp: expires_at.as_unix_secs(),
        };
        let payload = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).expect("claims are always serializable"));
        format!("{header}.{payload}.signature")
    }
}
