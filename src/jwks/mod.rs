//! JSON Web Key Set (JWKS) module
pub(crate) mod jwk;

use crate::error::{Error, Result};
use crate::jwks::jwk::Jwk;
use miniserde::{Deserialize, json};

/// JSON Web Key Set (JWKS)
///
/// Trusted authority keys for inner tokens. Several keys may share a `kid`;
/// each of them is tried during verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JwkSet {
    /// The keys in the set
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Parse a `{"keys":[...]}` document
    pub fn from_json(input: &str) -> Result<Self> {
        json::from_str(input).map_err(|_| Error::FormatInvalidJson("Failed to parse JWKS".into()))
    }

    pub fn push(&mut self, jwk: Jwk) {
        self.keys.push(jwk);
    }

    /// Keys whose `kid` equals `kid`, in set order
    pub fn keys_for<'a>(&'a self, kid: &'a str) -> impl Iterator<Item = &'a Jwk> + 'a {
        self.keys
            .iter()
            .filter(move |key| key.kid.as_deref() == Some(kid))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<Jwk> for JwkSet {
    fn from(jwk: Jwk) -> Self {
        Self { keys: vec![jwk] }
    }
}

impl FromIterator<Jwk> for JwkSet {
    fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(kid: &str, x: &str) -> Jwk {
        Jwk {
            kty: Some("OKP".into()),
            crv: Some("Ed25519".into()),
            kid: Some(kid.into()),
            x: Some(x.into()),
            ..Jwk::default()
        }
    }

    #[test]
    fn test_keys_for_returns_every_match() {
        let set: JwkSet = [key("a", "one"), key("b", "two"), key("a", "three")]
            .into_iter()
            .collect();

        let matches: Vec<_> = set.keys_for("a").map(|k| k.x.as_deref()).collect();
        assert_eq!(matches, vec![Some("one"), Some("three")]);
        assert_eq!(set.keys_for("missing").count(), 0);
    }

    #[test]
    fn test_keys_without_kid_never_match() {
        let mut set = JwkSet::default();
        set.push(Jwk {
            kid: None,
            ..key("", "x")
        });
        assert_eq!(set.keys_for("").count(), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_json() {
        let set = JwkSet::from_json(
            r#"{"keys":[{"kty":"OKP","crv":"Ed25519","kid":"E29A899C","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo","x5c":[]}]}"#,
        )
        .unwrap();
        assert_eq!(set.keys.len(), 1);
        assert!(set.keys[0].is_valid());

        assert!(JwkSet::from_json(r#"{"keys":{}}"#).is_err());
        assert!(JwkSet::from_json("not json").is_err());
    }
}
