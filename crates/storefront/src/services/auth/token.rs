//! Reading identity claims out of a login token.
//!
//! The token is a JWT. Only the payload is read; the signature is the
//! server's business, not the client's.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when reading a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has no payload segment")]
    MissingPayload,

    #[error("payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("payload is not a JSON claim set: {0}")]
    Claims(#[from] serde_json::Error),
}

/// The identity claims the shop puts in its tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress")]
    pub email: Option<String>,
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name")]
    pub first_name: Option<String>,
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname")]
    pub last_name: Option<String>,
}

impl TokenClaims {
    /// Decode the claims from a JWT's payload segment.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token has no payload or the payload is
    /// not base64url-encoded JSON.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let payload = token
            .split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or(TokenError::MissingPayload)?;

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
pub(crate) fn encode_for_test(claims: &serde_json::Value) -> String {
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{payload}.c2lnbmF0dXJl")
}
