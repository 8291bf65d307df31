//! RSA JSON Web Algorithm implementations

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::{error, jwa::Algorithm, jws, Base64Url};

#[cfg(any(test, feature = "private-keys"))]
mod private;

#[cfg(any(test, feature = "private-keys"))]
#[cfg_attr(docsrs, doc(cfg(feature = "private-keys")))]
pub use private::PrivateKey;

const MIN_MODULUS_BYTES: usize = 2048 / 8;
const MAX_MODULUS_BYTES: usize = 8192 / 8;

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
pub struct PublicKey {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's modulus
    #[must_use]
    pub fn modulus(&self) -> &[u8] {
        self.modulus.as_slice()
    }

    /// The public key's exponent
    #[must_use]
    pub fn exponent(&self) -> &[u8] {
        self.exponent.as_slice()
    }

    /// Constructs a public key from the big-endian modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus is outside of the 2048 to 8192 bit range, or the
    /// exponent is empty.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = strip_leading_zeros(modulus.into());
        let exponent = strip_leading_zeros(exponent.into());

        let len = modulus.as_slice().len();
        if !(MIN_MODULUS_BYTES..=MAX_MODULUS_BYTES).contains(&len) {
            return Err(error::key_rejected(
                "key modulus must be between 2048 and 8192 bits",
            ));
        }

        if exponent.as_slice().is_empty() {
            return Err(error::key_rejected("key exponent must not be zero"));
        }

        Ok(Self { modulus, exponent })
    }
}

fn strip_leading_zeros(v: Base64Url) -> Base64Url {
    match v.as_slice().iter().position(|&b| b != 0) {
        Some(0) => v,
        Some(idx) => Base64Url::from_raw(&v.as_slice()[idx..]),
        None => Base64Url::default(),
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = Algorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.verification_params(), data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

impl TryFrom<PublicKeyDto> for PublicKey {
    type Error = error::KeyRejected;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        Self::from_components(dto.modulus, dto.exponent)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
struct PublicKeyDto {
    #[serde(rename = "n")]
    modulus: Base64Url,

    #[serde(rename = "e")]
    exponent: Base64Url,
}
