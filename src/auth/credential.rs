use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Programmatic access / OAuth token.
    Bearer,
    /// RS256 key-pair JWT signed by this process.
    KeyPairJwt,
}

/// Opaque warehouse credential handed down to the query executor.
/// Only the constructors below can build one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    kind: Kind,
    token: String,
}

impl Credential {
    fn new(kind: Kind, token: String) -> Option<Self> {
        if token.trim().is_empty() {
            None
        } else {
            Some(Self { kind, token })
        }
    }

    /// Returns `None` for blank tokens so callers never hold an empty credential.
    pub fn bearer(token: impl Into<String>) -> Option<Self> {
        Self::new(Kind::Bearer, token.into())
    }

    pub fn key_pair_jwt(token: impl Into<String>) -> Option<Self> {
        Self::new(Kind::KeyPairJwt, token.into())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for `X-Snowflake-Authorization-Token-Type`, when one is needed.
    pub fn token_type(&self) -> Option<&'static str> {
        match self.kind {
            Kind::Bearer => None,
            Kind::KeyPairJwt => Some("KEYPAIR_JWT"),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Bearer => f.write_str("Credential::Bearer(***)"),
            Kind::KeyPairJwt => f.write_str("Credential::KeyPairJwt(***)"),
        }
    }
}
