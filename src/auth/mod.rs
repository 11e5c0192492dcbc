pub mod credential;
pub mod jwt;
pub mod middleware;

pub use credential::Credential;
pub use jwt::{KeyPairError, KeyPairSigner};
pub use middleware::{ForwardedToken, TokenForwarding};

use tracing::{info, warn};

use crate::configuration::{AuthMethod, Settings};

/// Decides which credential an operation runs with.
///
/// stdio and internal-gateway deployments use the process's own token or
/// key pair; every other transport forwards the caller's `X-Snowflake-Token`.
pub struct CredentialResolver {
    local: bool,
    method: AuthMethod,
    token: Option<String>,
    signer: Option<KeyPairSigner>,
}

impl CredentialResolver {
    pub fn new(settings: &Settings) -> Result<Self, KeyPairError> {
        let signer = match (&settings.auth_method, &settings.key_pair) {
            (AuthMethod::PrivateKey, Some(key_pair)) if settings.uses_local_credential() => {
                Some(KeyPairSigner::from_settings(key_pair)?)
            }
            _ => None,
        };

        Ok(Self {
            local: settings.uses_local_credential(),
            method: settings.auth_method,
            token: settings.token.clone(),
            signer,
        })
    }

    /// `Ok(None)` means no credential is available; the operation must refuse to query.
    pub fn resolve(&self, forwarded: Option<&ForwardedToken>) -> Result<Option<Credential>, KeyPairError> {
        if !self.local {
            return Ok(match forwarded.and_then(|t| Credential::bearer(t.0.clone())) {
                Some(credential) => {
                    info!("using forwarded X-Snowflake-Token");
                    Some(credential)
                }
                None => {
                    warn!("X-Snowflake-Token header missing or empty");
                    None
                }
            });
        }

        match (self.method, &self.signer) {
            (AuthMethod::PrivateKey, Some(signer)) => Ok(Credential::key_pair_jwt(signer.generate_token()?)),
            (AuthMethod::PrivateKey, None) => Ok(None),
            (AuthMethod::Token, _) => Ok(self.token.clone().and_then(Credential::bearer)),
        }
    }
}
