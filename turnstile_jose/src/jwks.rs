use serde::{Deserialize, Serialize};

use crate::{jwa, jwk, Jwk};

/// A JSON Web Key Set (JWKS)
///
/// Keys that cannot be understood, such as symmetric or elliptic curve
/// keys, are dropped while deserializing rather than failing the whole set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Whether the set holds no usable keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Gets the key with exactly the given key id that is usable with `alg`
    ///
    /// Keys without an id never match. When several keys share an id, one
    /// that explicitly names `alg` is preferred.
    #[must_use]
    pub fn get_key_by_id(&self, kid: &jwk::KeyIdRef, alg: jwa::Algorithm) -> Option<&Jwk> {
        let best = self.keys.iter().fold(None, move |best, k| {
            if k.key_id() != Some(kid) || !k.is_compatible(alg) {
                return best;
            }

            let score = u8::from(k.algorithm().is_some()) * 2 + u8::from(k.usage().is_some());

            match best {
                Some((_, best_score)) if best_score < score => Some((k, score)),
                None => Some((k, score)),
                _ => best,
            }
        });

        best.map(|(b, _)| b)
    }
}

impl FromIterator<Jwk> for Jwks {
    fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MaybeJwksVisitor;

    impl<'de> serde::de::Visitor<'de> for MaybeJwksVisitor {
        type Value = Vec<Jwk>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(value) = seq.next_element()? {
                match value {
                    MaybeJwk::Jwk(jwk) => values.push(jwk),
                    MaybeJwk::Unknown(key) => {
                        tracing::warn!(
                            jwks.idx = index,
                            jwk.kid = ?key.kid,
                            jwk.kty = ?key.kty,
                            jwk.alg = ?key.alg,
                            "ignoring unsupported JWK"
                        );
                    }
                }
                index += 1;
            }

            Ok(values)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(Jwk),
        Unknown(JwkLike),
    }

    #[derive(Deserialize)]
    struct JwkLike {
        #[serde(default)]
        kid: Option<jwk::KeyId>,
        #[serde(default)]
        kty: Option<String>,
        #[serde(default)]
        alg: Option<String>,
    }

    deserializer.deserialize_seq(MaybeJwksVisitor)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use tracing_test::traced_test;

    use super::*;
    use crate::{jwa::rsa::PrivateKey, jwk::KeyIdRef, test};

    const JWKS_WITH_UNKNOWN_ALG: &str = r#"
        {
            "keys": [
                {
                    "kid": "1",
                    "use": "enc",
                    "alg": "RSA-OAEP"
                }
            ]
        }
    "#;

    const JWKS_WITH_NOTHING: &str = r#"
        {
            "keys": [
                {}
            ]
        }
    "#;

    #[test]
    #[traced_test]
    fn skips_unknown_alg() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS_WITH_UNKNOWN_ALG)?;
        assert!(jwks.is_empty());
        assert!(logs_contain("ignoring unsupported JWK"));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn skips_empty_key() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS_WITH_NOTHING)?;
        assert!(jwks.is_empty());
        Ok(())
    }

    #[test]
    fn decodes_rsa_jwks() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::rsa::JWKS)?;
        assert_eq!(jwks.keys().len(), 1);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn keeps_only_rsa_from_mixed_set() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::mixed::JWKS)?;
        assert_eq!(jwks.keys().len(), 1);
        assert_eq!(
            jwks.keys()[0].key_id(),
            Some(KeyIdRef::from_static(test::rsa::TEST_KEY_ID))
        );
        Ok(())
    }

    #[test]
    fn missing_keys_member_is_an_error() {
        assert!(serde_json::from_str::<Jwks>(r#"{"kys": []}"#).is_err());
        assert!(serde_json::from_str::<Jwks>("[]").is_err());
    }

    #[test]
    fn lookup_requires_exact_key_id() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::rsa::JWKS)?;

        assert!(jwks
            .get_key_by_id(KeyIdRef::from_static("kid-1"), jwa::Algorithm::RS256)
            .is_some());
        assert!(jwks
            .get_key_by_id(KeyIdRef::from_static("KID-1"), jwa::Algorithm::RS256)
            .is_none());
        assert!(jwks
            .get_key_by_id(KeyIdRef::from_static("kid-2"), jwa::Algorithm::RS256)
            .is_none());
        Ok(())
    }

    #[test]
    fn lookup_skips_keys_pinned_to_other_algorithms() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::rsa::JWKS)?;
        assert!(jwks
            .get_key_by_id(KeyIdRef::from_static("kid-1"), jwa::Algorithm::PS256)
            .is_none());
        Ok(())
    }

    #[test]
    fn lookup_ignores_keys_without_id() -> Result<()> {
        let key = PrivateKey::generate()?;
        let jwks: Jwks = std::iter::once(Jwk::from(key.public_key().clone())).collect();
        assert!(jwks
            .get_key_by_id(KeyIdRef::from_static("kid-1"), jwa::Algorithm::RS256)
            .is_none());
        Ok(())
    }

    #[test]
    fn lookup_prefers_key_naming_the_algorithm() -> Result<()> {
        let generic = Jwk::from(PrivateKey::generate()?.public_key().clone()).with_key_id("shared");
        let pinned = Jwk::from(PrivateKey::generate()?.public_key().clone())
            .with_key_id("shared")
            .with_algorithm(jwa::Algorithm::RS384);

        let jwks: Jwks = vec![generic.clone(), pinned.clone()].into_iter().collect();

        let found = jwks.get_key_by_id(KeyIdRef::from_static("shared"), jwa::Algorithm::RS384);
        assert_eq!(found, Some(&pinned));

        let found = jwks.get_key_by_id(KeyIdRef::from_static("shared"), jwa::Algorithm::RS256);
        assert_eq!(found, Some(&generic));
        Ok(())
    }
}
