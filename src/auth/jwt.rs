use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode, errors::Error as JwtError};
use pkcs8::der::pem::PemLabel;
use pkcs8::{Document, EncryptedPrivateKeyInfo, LineEnding, PrivateKeyInfo};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

use crate::configuration::KeyPairSettings;

#[derive(Debug, Error)]
pub enum KeyPairError {
    #[error("failed to read private key {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid RSA private key: {0}")]
    InvalidKey(JwtError),
    #[error("failed to decrypt private key: {0}")]
    Decrypt(String),
    #[error("failed to sign key-pair token: {0}")]
    Signing(JwtError),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeyPairClaims {
    pub iss: String, // ACCOUNT.USER.SHA256:<fingerprint>
    pub sub: String, // ACCOUNT.USER
    pub iat: usize,
    pub exp: usize,
}

/// Signs Snowflake key-pair authentication JWTs.
pub struct KeyPairSigner {
    key: EncodingKey,
    issuer: String,
    subject: String,
}

impl KeyPairSigner {
    pub fn from_settings(settings: &KeyPairSettings) -> Result<Self, KeyPairError> {
        let pem = fs::read(&settings.private_key_path).map_err(|source| KeyPairError::Read {
            path: settings.private_key_path.clone(),
            source,
        })?;

        Self::from_pem(
            &pem,
            settings.private_key_passphrase.as_deref(),
            &settings.account,
            &settings.username,
            &settings.public_key_fingerprint,
        )
    }

    /// Accepts an unencrypted key, or an `ENCRYPTED PRIVATE KEY` when
    /// `passphrase` is given.
    pub fn from_pem(
        pem: &[u8],
        passphrase: Option<&str>,
        account: &str,
        username: &str,
        fingerprint: &str,
    ) -> Result<Self, KeyPairError> {
        let key = match passphrase {
            Some(passphrase) => decrypt_key(pem, passphrase)?,
            None => EncodingKey::from_rsa_pem(pem).map_err(KeyPairError::InvalidKey)?,
        };

        // Region and cloud suffixes are not part of the qualified name.
        let account = account
            .split('.')
            .next()
            .unwrap_or(account)
            .to_uppercase();
        let subject = format!("{}.{}", account, username.to_uppercase());
        let fingerprint = if fingerprint.starts_with("SHA256:") {
            fingerprint.to_string()
        } else {
            format!("SHA256:{}", fingerprint)
        };

        Ok(Self {
            key,
            issuer: format!("{}.{}", subject, fingerprint),
            subject,
        })
    }

    pub fn generate_token(&self) -> Result<String, KeyPairError> {
        let now = Utc::now();
        let claims = KeyPairClaims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(1)).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key).map_err(KeyPairError::Signing)
    }
}

fn decrypt_error(err: impl std::fmt::Display) -> KeyPairError {
    KeyPairError::Decrypt(err.to_string())
}

/// Decrypts a PBES2 PKCS#8 key and re-encodes it as plain PKCS#8 PEM.
fn decrypt_key(pem: &[u8], passphrase: &str) -> Result<EncodingKey, KeyPairError> {
    let pem = std::str::from_utf8(pem).map_err(decrypt_error)?;
    let (label, document) = Document::from_pem(pem).map_err(decrypt_error)?;
    if label != EncryptedPrivateKeyInfo::PEM_LABEL {
        // Unencrypted keys need no passphrase.
        return EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(KeyPairError::InvalidKey);
    }

    let info = EncryptedPrivateKeyInfo::try_from(document.as_bytes()).map_err(decrypt_error)?;
    let decrypted = info.decrypt(passphrase).map_err(decrypt_error)?;
    let plain = decrypted
        .to_pem(PrivateKeyInfo::PEM_LABEL, LineEnding::LF)
        .map_err(decrypt_error)?;

    EncodingKey::from_rsa_pem(plain.as_bytes()).map_err(KeyPairError::InvalidKey)
}
