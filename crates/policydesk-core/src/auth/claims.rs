//! Reading the payload of an access token.
//!
//! The client never verifies signatures; it only needs the expiry claim to
//! decide whether a stored token is still worth sending.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed token: expected header.payload.signature")]
    Malformed,

    #[error("Token payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Token payload is not valid claims JSON: {0}")]
    Claims(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// True iff the expiry is strictly after `now`, compared in milliseconds.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.saturating_mul(1000) > now.timestamp_millis()
    }
}

pub fn decode_claims(token: &str) -> Result<AccessClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_exp_and_sub() {
        let token = token_with_payload(r#"{"sub":"pat@example.com","exp":1700000000}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("pat@example.com"));
        assert_eq!(claims.exp, 1_700_000_000);
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_liveness_is_strict() {
        let now = Utc::now();
        let claims = |exp: i64| AccessClaims { sub: None, exp };
        assert!(claims((now + Duration::minutes(5)).timestamp()).is_live_at(now));
        assert!(!claims((now - Duration::minutes(5)).timestamp()).is_live_at(now));

        let on_the_second = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(!claims(1_700_000_000).is_live_at(on_the_second));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(decode_claims("opaque"), Err(TokenError::Malformed)));
        assert!(matches!(decode_claims("a.b.c.d"), Err(TokenError::Malformed)));
        assert!(matches!(decode_claims("a.!!!.c"), Err(TokenError::Encoding(_))));

        let no_exp = token_with_payload(r#"{"sub":"x"}"#);
        assert!(matches!(decode_claims(&no_exp), Err(TokenError::Claims(_))));
    }
}
