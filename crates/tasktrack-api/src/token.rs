//! JWT bearer tokens.
//!
//! [`JwtVerifier`] is the bundled [`IdentityProvider`]. It checks a signed JWT
//! against one configured public key (PEM) and algorithm, enforces `exp` with
//! a leeway, and optionally pins `iss` and `aud`. The subject is the `sub`
//! claim.
//!
//! [`generate_keypair`] and [`mint`] issue EdDSA tokens for local development
//! and tests.

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{
  SigningKey,
  pkcs8::{EncodePrivateKey as _, EncodePublicKey as _, spki::der::pem::LineEnding},
};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tasktrack_core::identity::{IdentityProvider, VerifiedSubject};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("token expired")]
  Expired,
  #[error("token has an empty subject")]
  EmptySubject,
  #[error("invalid token: {0}")]
  Jwt(#[from] jsonwebtoken::errors::Error),
  #[error("unsupported algorithm {0:?}")]
  UnsupportedAlgorithm(Algorithm),
  #[error("invalid key: {0}")]
  Key(String),
}

/// Claims written by [`mint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub iat: i64,
  pub exp: i64,
}

/// The only claim read back after validation; `aud` may be a string or a
/// list, so it is left to [`Validation`].
#[derive(Deserialize)]
struct SubjectClaim {
  sub: String,
}

// ─── Keys ────────────────────────────────────────────────────────────────────

/// A fresh Ed25519 keypair as `(private PKCS#8 PEM, public SPKI PEM)`.
pub fn generate_keypair() -> Result<(String, String), TokenError> {
  let signing_key = SigningKey::generate(&mut OsRng);
  let private = signing_key
    .to_pkcs8_pem(LineEnding::LF)
    .map_err(|e| TokenError::Key(e.to_string()))?;
  let public = signing_key
    .verifying_key()
    .to_public_key_pem(LineEnding::LF)
    .map_err(|e| TokenError::Key(e.to_string()))?;
  Ok((private.as_str().to_owned(), public))
}

/// Parse a PKCS#8 PEM Ed25519 private key for [`mint`].
pub fn encoding_key_from_pem(pem: &str) -> Result<EncodingKey, TokenError> {
  Ok(EncodingKey::from_ed_pem(pem.as_bytes())?)
}

fn decoding_key_from_pem(
  algorithm: Algorithm,
  pem: &str,
) -> Result<DecodingKey, TokenError> {
  let pem = pem.as_bytes();
  Ok(match algorithm {
    Algorithm::EdDSA => DecodingKey::from_ed_pem(pem)?,
    Algorithm::RS256
    | Algorithm::RS384
    | Algorithm::RS512
    | Algorithm::PS256
    | Algorithm::PS384
    | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem)?,
    Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem)?,
    other => return Err(TokenError::UnsupportedAlgorithm(other)),
  })
}

// ─── Minting ─────────────────────────────────────────────────────────────────

/// Issue an EdDSA token for `subject`, valid for `ttl` from `issued_at`.
pub fn mint(
  key: &EncodingKey,
  subject: &str,
  issued_at: DateTime<Utc>,
  ttl: Duration,
) -> Result<String, TokenError> {
  let claims = Claims {
    sub: subject.to_owned(),
    iat: issued_at.timestamp(),
    exp: (issued_at + ttl).timestamp(),
  };
  Ok(jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, key)?)
}

// ─── Verification ────────────────────────────────────────────────────────────

/// Verifies JWTs signed by a single identity-provider key.
#[derive(Clone)]
pub struct JwtVerifier {
  key:        DecodingKey,
  validation: Validation,
}

impl JwtVerifier {
  /// Accept tokens signed with `algorithm` by the holder of `public_key_pem`.
  pub fn from_pem(
    algorithm: Algorithm,
    public_key_pem: &str,
    leeway_secs: u64,
  ) -> Result<Self, TokenError> {
    let key = decoding_key_from_pem(algorithm, public_key_pem)?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = leeway_secs;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "sub"]);
    Ok(Self { key, validation })
  }

  /// Require `iss` to equal `issuer`.
  pub fn with_issuer(mut self, issuer: &str) -> Self {
    self.validation.set_issuer(&[issuer]);
    self
  }

  /// Require `aud` to contain `audience`.
  pub fn with_audience(mut self, audience: &str) -> Self {
    self.validation.set_audience(&[audience]);
    self.validation.validate_aud = true;
    self
  }

  pub fn verify_token(&self, token: &str) -> Result<VerifiedSubject, TokenError> {
    let data = jsonwebtoken::decode::<SubjectClaim>(token, &self.key, &self.validation)
      .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Jwt(e),
      })?;
    if data.claims.sub.trim().is_empty() {
      return Err(TokenError::EmptySubject);
    }
    Ok(VerifiedSubject::new(data.claims.sub))
  }
}

impl IdentityProvider for JwtVerifier {
  type Error = TokenError;

  async fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> Result<VerifiedSubject, TokenError> {
    self.verify_token(token)
  }
}
