//! Implementations of the JSON Web Tokens (JWT) standard
//!
//! The specifications for this standard can be found in [RFC7519][].
//!
//! Unencrypted JWTs appear as three base64url segments separated by `.`:
//! a JSON header, a JSON payload, and a binary signature over the first two.
//!
//! The header names the algorithm and the key that produced the signature.
//! Nothing in it can be trusted, so it is only used to select a key from a
//! [`Jwks`], and the algorithm it names must be on the validator's approved
//! list. Every segment must be valid base64url before anything else is
//! looked at, but the payload is not parsed as claims until the signature
//! has been checked.
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::{fmt, time::Duration};

use aliri_braid::braid;
use serde::{Deserialize, Serialize};
use turnstile_clock::{Clock, System, UnixTime};

use crate::{error, jwa, jwk, jws, Base64Url, Jwks};

/// The verified headers and claims of a JWT
///
/// This type can _only_ be produced within this crate, after the token's
/// signature has been checked against a known key and its core claims have
/// passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified<C = BasicClaims> {
    headers: Headers,
    claims: C,
}

impl<C> Verified<C> {
    /// Extracts the header and claims from the token
    pub fn extract(self) -> (Headers, C) {
        (self.headers, self.claims)
    }

    /// The verified token headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The verified token claims
    pub fn claims(&self) -> &C {
        &self.claims
    }
}

/// The JOSE header of a JWT
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Headers {
    alg: jwa::Algorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<jwk::KeyId>,
}

impl Headers {
    /// Constructs JWT headers, to be signed by the specified algorithm
    pub const fn new(alg: jwa::Algorithm) -> Self {
        Self { alg, kid: None }
    }

    /// Constructs JWT headers, with a specific signing algorithm and key ID
    pub fn with_key_id(alg: jwa::Algorithm, kid: impl Into<jwk::KeyId>) -> Self {
        Self {
            alg,
            kid: Some(kid.into()),
        }
    }

    /// The signing algorithm
    #[must_use]
    pub fn alg(&self) -> jwa::Algorithm {
        self.alg
    }

    /// The ID of the key that produced the signature
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.kid.as_deref()
    }
}

#[derive(Deserialize)]
struct RawHeaders {
    alg: String,
    #[serde(default)]
    kid: Option<jwk::KeyId>,
}

/// A decomposed JWT
///
/// All three segments are valid base64url and the header names a supported
/// algorithm; neither the signature nor the payload claims have been checked.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Decomposed<'a> {
    header: Headers,
    message: &'a str,
    payload: Base64Url,
    signature: Base64Url,
}

impl<'a> Decomposed<'a> {
    /// Verifies the decomposed JWT against the given key using the system clock
    ///
    /// # Errors
    ///
    /// Returns an error if the signature does not match or the claims are
    /// rejected by the validator.
    pub fn verify<C, V>(
        self,
        key: &V,
        validator: &CoreValidator,
    ) -> Result<Verified<C>, error::JwtVerifyError>
    where
        C: for<'de> Deserialize<'de> + CoreClaims,
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
    {
        self.verify_with_clock(key, validator, &System)
    }

    /// Verifies the decomposed JWT against the given key, judging time
    /// claims by `clock`
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not approved, the signature does
    /// not match, the payload is not valid JSON for `C`, or the claims are
    /// rejected by the validator.
    pub fn verify_with_clock<C, V, K>(
        self,
        key: &V,
        validator: &CoreValidator,
        clock: &K,
    ) -> Result<Verified<C>, error::JwtVerifyError>
    where
        C: for<'de> Deserialize<'de> + CoreClaims,
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
        K: Clock + ?Sized,
    {
        validator.check_algorithm(self.header.alg)?;

        key.verify(
            self.header.alg,
            self.message.as_bytes(),
            self.signature.as_slice(),
        )?;

        let claims: C =
            serde_json::from_slice(self.payload.as_slice()).map_err(error::malformed_jwt_payload)?;

        validator.validate_with_clock(&claims, clock)?;

        Ok(Verified {
            headers: self.header,
            claims,
        })
    }

    /// The untrusted header of the JWT
    ///
    /// **WARNING:** *This header has not been validated and should not be trusted.*
    /// Only use it to choose which key to verify the token with.
    pub fn untrusted_header(&self) -> &Headers {
        &self.header
    }

    /// The declared signing algorithm
    #[must_use]
    pub fn alg(&self) -> jwa::Algorithm {
        self.header.alg
    }

    /// The declared signing key
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.header.kid()
    }
}

macro_rules! expect_three {
    ($iter:expr) => {{
        let mut i = $iter;
        match (i.next(), i.next(), i.next(), i.next()) {
            (Some(first), Some(second), Some(third), None) => Some((first, second, third)),
            _ => None,
        }
    }};
}

impl JwtRef {
    /// Decomposes the JWT into its parts, preparing it for later processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWT is not three base64url segments, if the
    /// header is not a JSON object with an `alg` member, or if that algorithm
    /// is not a supported RSA signature algorithm.
    pub fn decompose(&self) -> Result<Decomposed<'_>, error::JwtVerifyError> {
        let (h_str, p_str, s_str) =
            expect_three!(self.as_str().split('.')).ok_or_else(error::malformed_jwt)?;
        let message = &self.as_str()[..h_str.len() + 1 + p_str.len()];

        let h_raw = Base64Url::from_encoded(h_str).map_err(error::malformed_jwt_header)?;
        let payload = Base64Url::from_encoded(p_str).map_err(error::malformed_jwt_payload)?;
        let signature = Base64Url::from_encoded(s_str).map_err(error::malformed_jwt_signature)?;
        let raw: RawHeaders =
            serde_json::from_slice(h_raw.as_slice()).map_err(error::malformed_jwt_header)?;

        let alg = jwa::Algorithm::try_from(raw.alg.as_str())?;

        Ok(Decomposed {
            header: Headers { alg, kid: raw.kid },
            message,
            payload,
            signature,
        })
    }

    /// Verifies the token against the matching key from a key set
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// token structure, approved algorithm, presence of a key id, key
    /// lookup, signature, then the claims.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownKeyId`][error::JwtVerifyError::UnknownKeyId] when the
    /// key set holds no compatible key with the token's key id. A refreshed
    /// key set may resolve this; no other error can be fixed that way.
    pub fn verify_with_keys<C, K>(
        &self,
        keys: &Jwks,
        validator: &CoreValidator,
        clock: &K,
    ) -> Result<Verified<C>, error::JwtVerifyError>
    where
        C: for<'de> Deserialize<'de> + CoreClaims,
        K: Clock + ?Sized,
    {
        let decomposed = self.decompose()?;

        let alg = decomposed.alg();
        validator.check_algorithm(alg)?;

        let kid = decomposed.kid().ok_or_else(error::missing_key_id)?;

        let key = keys.get_key_by_id(kid, alg).ok_or_else(|| {
            tracing::debug!(jwt.kid = %kid, jwt.alg = %alg, "unable to find matching key");
            error::unknown_key_id(kid)
        })?;

        decomposed.verify_with_clock(key, validator, clock)
    }
}

/// Core claims that most compliant and secure JWT tokens should have
pub trait CoreClaims {
    /// Not before
    ///
    /// A verifier MUST reject this token before the given time.
    fn nbf(&self) -> Option<UnixTime>;

    /// Expires
    ///
    /// A verifier MUST reject this token at or after the given time.
    fn exp(&self) -> Option<UnixTime>;

    /// Issuer
    ///
    /// A verifier MUST reject this token if it the issuer is not approved.
    fn iss(&self) -> Option<&IssuerRef>;
}

/// An issuer of JWTs
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// The subject of a JWT
#[braid(serde, ref_doc = "A borrowed reference to a [`Subject`]")]
pub struct Subject;

/// A JSON Web Token
///
/// The [`Display`][JwtRef#impl-Display] and [`Debug`][JwtRef#impl-Debug]
/// implementations never print the signature, and print nothing at all
/// unless the alternate form is requested.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a JSON Web Token ([`Jwt`])\n\
    \n\
    The [`Display`][Self#impl-Display] and [`Debug`][Self#impl-Debug] \
    implementations never print the signature, and print nothing at all \
    unless the alternate form is requested.
    "
)]
#[must_use]
pub struct Jwt;

#[cfg(any(test, feature = "private-keys"))]
#[cfg_attr(docsrs, doc(cfg(feature = "private-keys")))]
impl Jwt {
    /// Constructs a new JWT from a header and payload, signed by `signer`
    ///
    /// # Errors
    ///
    /// * If serialization of either the header or payload fails
    /// * If the signer cannot produce a signature with the header's algorithm
    pub fn try_from_parts_with_signature<P, S>(
        headers: &Headers,
        payload: &P,
        signer: &S,
    ) -> Result<Self, error::JwtSigningError>
    where
        P: Serialize,
        S: jws::Signer<Algorithm = jwa::Algorithm>,
        error::JwtSigningError: From<S::Error>,
    {
        if !signer.can_sign(headers.alg) {
            return Err(error::incompatible_algorithm(headers.alg).into());
        }

        let h_raw =
            Base64Url::from_raw(serde_json::to_vec(headers).map_err(error::malformed_jwt_header)?);
        let p_raw =
            Base64Url::from_raw(serde_json::to_vec(payload).map_err(error::malformed_jwt_payload)?);

        let mut message = format!("{}.{}", h_raw, p_raw);
        let s = Base64Url::from_raw(signer.sign(headers.alg, message.as_bytes())?);
        message.push('.');
        message.push_str(&s.to_string());

        Ok(Self::new(message))
    }
}

impl JwtRef {
    fn redacted(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.rfind('.') {
            Some(idx) => {
                f.write_str(&self.0[..=idx])?;
                f.write_str("…")
            }
            None => f.write_str("…"),
        }
    }
}

/// Prints `***JWT***`, or with `{:#?}` the quoted header and payload
/// segments followed by an elided signature.
impl fmt::Debug for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            self.redacted(f)?;
            f.write_str("\"")
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// Prints `***JWT***`, or with `{:#}` the header and payload segments
/// followed by an elided signature.
impl fmt::Display for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            self.redacted(f)
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// A core validator for JWTs
///
/// Expiration is always enforced. `nbf` is checked whenever the token
/// carries it. Both time checks allow the same leeway, which defaults to
/// zero.
///
/// An empty set of approved algorithms approves nothing.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct CoreValidator {
    approved_algorithms: Vec<jwa::Algorithm>,
    leeway: Duration,
    issuer: Option<Issuer>,
}

impl CoreValidator {
    /// Allows a grace period for token validation
    ///
    /// Applies on either side of the "not before" and "expires" claims.
    #[inline]
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self { leeway, ..self }
    }

    /// Allows a grace period (in seconds) for token validation
    #[inline]
    pub fn with_leeway_secs(self, leeway: u64) -> Self {
        self.with_leeway(Duration::from_secs(leeway))
    }

    /// Approves a single algorithm
    #[inline]
    pub fn add_approved_algorithm(self, alg: jwa::Algorithm) -> Self {
        let mut this = self;
        this.approved_algorithms.push(alg);
        this
    }

    /// Approves multiple algorithms
    #[inline]
    pub fn extend_approved_algorithms<I: IntoIterator<Item = jwa::Algorithm>>(
        self,
        alg: I,
    ) -> Self {
        let mut this = self;
        this.approved_algorithms.extend(alg);
        this
    }

    /// Require that tokens specify a particular issuer
    #[inline]
    pub fn require_issuer(self, issuer: Issuer) -> Self {
        Self {
            issuer: Some(issuer),
            ..self
        }
    }

    /// The approved algorithms
    #[must_use]
    pub fn approved_algorithms(&self) -> &[jwa::Algorithm] {
        &self.approved_algorithms
    }

    /// The configured grace period
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// The required issuer, if any
    #[must_use]
    pub fn issuer(&self) -> Option<&IssuerRef> {
        self.issuer.as_deref()
    }

    fn check_algorithm(&self, alg: jwa::Algorithm) -> Result<(), error::UnsupportedAlgorithm> {
        if self.approved_algorithms.contains(&alg) {
            Ok(())
        } else {
            Err(error::unsupported_algorithm(alg.as_str()))
        }
    }

    /// Validates the time and issuer claims of a payload
    ///
    /// # Errors
    ///
    /// * `exp` is missing, or `now >= exp + leeway`
    /// * `nbf` is present and `nbf > now + leeway`
    /// * an issuer is required and `iss` is missing or not exactly equal
    pub fn validate_with_clock<T, K>(
        &self,
        claims: &T,
        clock: &K,
    ) -> Result<(), error::ClaimsRejected>
    where
        T: CoreClaims,
        K: Clock + ?Sized,
    {
        let now = clock.now();
        let leeway = self.leeway.as_secs();

        match claims.exp() {
            Some(exp) if now.0 < exp.0.saturating_add(leeway) => {}
            Some(_) => return Err(error::ClaimsRejected::TokenExpired),
            None => return Err(error::ClaimsRejected::MissingRequiredClaim("exp")),
        }

        if let Some(nbf) = claims.nbf() {
            if nbf.0 > now.0.saturating_add(leeway) {
                return Err(error::ClaimsRejected::TokenNotYetValid);
            }
        }

        if let Some(allowed_iss) = &self.issuer {
            match claims.iss() {
                Some(iss) if iss.as_str() == allowed_iss.as_str() => {}
                Some(_) => return Err(error::ClaimsRejected::InvalidIssuer),
                None => return Err(error::ClaimsRejected::MissingRequiredClaim("iss")),
            }
        }

        Ok(())
    }
}

/// Common claims used in JWTs
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct BasicClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
}

impl CoreClaims for BasicClaims {
    fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    fn iss(&self) -> Option<&IssuerRef> {
        self.iss.as_deref()
    }
}

impl BasicClaims {
    /// Constructs a new, empty payload
    pub const fn new() -> Self {
        Self {
            iss: None,
            sub: None,
            exp: None,
            nbf: None,
        }
    }

    /// The subject
    #[must_use]
    pub fn sub(&self) -> Option<&SubjectRef> {
        self.sub.as_deref()
    }

    /// Sets the `iss` claim for the JWT
    pub fn with_issuer(mut self, iss: impl Into<Issuer>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Sets the `sub` claim for the JWT
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the `exp` claim for the JWT
    pub fn with_expiration(mut self, time: UnixTime) -> Self {
        self.exp = Some(time);
        self
    }

    /// Sets the `exp` claim to `secs` seconds after the clock's current time
    pub fn with_future_expiration_from_clock<K: Clock>(mut self, secs: u64, clock: &K) -> Self {
        self.exp = Some(clock.now() + Duration::from_secs(secs));
        self
    }

    /// Sets the `nbf` claim for the JWT
    pub fn with_not_before(mut self, time: UnixTime) -> Self {
        self.nbf = Some(time);
        self
    }
}
