//! Credential minting and verification.
//!
//! Callers prove their identity with an HMAC-signed JWT carried in the
//! `Authorization` header. The signing secret is process-wide configuration,
//! loaded once at startup; request handling never reads ambient state.

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use displaydoc::Display;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::Error as JWTError;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::graphql::ErrorExtension;

const HEADER_VALUE_PREFIX: &str = "Bearer";

#[derive(Debug, Display, Error)]
pub(crate) enum AuthenticationError {
    /// request has no 'authorization' header
    MissingHeader,

    /// header value is not convertible to a string
    CannotConvertToString,

    /// header value is not correctly formatted: prefix should be '{0}'
    InvalidPrefix(&'static str),

    /// header value is not correctly formatted: missing JWT
    MissingJWT,

    /// cannot decode JWT: {0}
    CannotDecodeJWT(JWTError),

    /// cannot sign JWT: {0}
    CannotSignJWT(JWTError),

    /// system time is set before the UNIX epoch
    InvalidSystemTime,
}

impl ErrorExtension for AuthenticationError {
    fn extension_code(&self) -> String {
        "UNAUTHENTICATED".to_string()
    }
}

/// The identity of a caller, recovered from a verified credential.
///
/// Lives for the duration of one request and is only ever used to constrain
/// storage queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CallerIdentity {
    client_id: String,
}

impl CallerIdentity {
    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    client_id: String,
    exp: u64,
}

/// Signs and verifies caller credentials with the process-wide secret.
pub(crate) struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: Duration,
}

impl JwtAuth {
    pub(crate) fn new(secret: &str, token_expiry: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_expiry,
        }
    }

    /// Mint a signed credential embedding `client_id`.
    pub(crate) fn sign(&self, client_id: &str) -> Result<String, AuthenticationError> {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthenticationError::InvalidSystemTime)?;
        let claims = Claims {
            client_id: client_id.to_owned(),
            exp: (issued_at + self.token_expiry).as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthenticationError::CannotSignJWT)
    }

    /// Verify a credential's signature and expiry, and extract the caller
    /// identity it embeds.
    ///
    /// A failure here must propagate: an invalid credential never resolves to
    /// an anonymous identity.
    pub(crate) fn verify_and_extract(
        &self,
        credential: &str,
    ) -> Result<CallerIdentity, AuthenticationError> {
        let token = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(AuthenticationError::CannotDecodeJWT)?;
        Ok(CallerIdentity {
            client_id: token.claims.client_id,
        })
    }

    /// Pull the raw credential out of the `Authorization` header.
    pub(crate) fn extract_credential(headers: &HeaderMap) -> Result<&str, AuthenticationError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthenticationError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthenticationError::CannotConvertToString)?;
        let mut parts = value.splitn(2, ' ');
        let prefix = parts.next().unwrap_or_default();
        if !prefix.eq_ignore_ascii_case(HEADER_VALUE_PREFIX) {
            return Err(AuthenticationError::InvalidPrefix(HEADER_VALUE_PREFIX));
        }
        match parts.next().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthenticationError::MissingJWT),
        }
    }

    /// Authenticate a request from its headers.
    pub(crate) fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<CallerIdentity, AuthenticationError> {
        self.verify_and_extract(Self::extract_credential(headers)?)
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn auth() -> JwtAuth {
        JwtAuth::new("a very quiet secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_sign_then_verify_roundtrip() {
        let auth = auth();
        let credential = auth.sign("1030").unwrap();
        let identity = auth.verify_and_extract(&credential).unwrap();
        assert_eq!(identity.client_id(), "1030");
    }

    #[test]
    fn test_tampered_credential_is_rejected() {
        let auth = auth();
        let mut credential = auth.sign("1030").unwrap();
        // flip the last character of the signature
        let last = credential.pop().unwrap();
        credential.push(if last == 'A' { 'B' } else { 'A' });
        assert!(matches!(
            auth.verify_and_extract(&credential),
            Err(AuthenticationError::CannotDecodeJWT(_))
        ));
    }

    #[test]
    fn test_empty_credential_is_rejected() {
        assert!(matches!(
            auth().verify_and_extract(""),
            Err(AuthenticationError::CannotDecodeJWT(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let credential = auth().sign("1030").unwrap();
        let other = JwtAuth::new("another secret entirely", Duration::from_secs(3600));
        assert!(other.verify_and_extract(&credential).is_err());
    }

    #[test]
    fn test_expired_credential_is_rejected() {
        let auth = auth();
        let past = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            - 7200;
        let claims = Claims {
            client_id: "1030".to_string(),
            exp: past,
        };
        let credential = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &auth.encoding_key,
        )
        .unwrap();
        assert!(auth.verify_and_extract(&credential).is_err());
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            JwtAuth::extract_credential(&headers),
            Err(AuthenticationError::MissingHeader)
        ));
    }

    #[test]
    fn test_wrong_prefix_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            JwtAuth::extract_credential(&headers),
            Err(AuthenticationError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(JwtAuth::extract_credential(&headers).unwrap(), "abc.def.ghi");
    }
}
