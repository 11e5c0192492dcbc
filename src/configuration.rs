use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
    Sse,
    StreamableHttp,
}

impl Transport {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "stdio" => Some(Transport::Stdio),
            "http" => Some(Transport::Http),
            "sse" => Some(Transport::Sse),
            "streamable-http" => Some(Transport::StreamableHttp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Token,
    PrivateKey,
}

#[derive(Debug, Clone)]
pub struct KeyPairSettings {
    pub account: String,
    pub username: String,
    pub private_key_path: String,
    pub public_key_fingerprint: String,
    pub private_key_passphrase: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: String,
    pub internal_gateway: bool,
    pub auth_method: AuthMethod,
    pub token: Option<String>,
    pub key_pair: Option<KeyPairSettings>,
    pub http_timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup` so callers can supply a fixed map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let transport = match get("MCP_TRANSPORT") {
            Some(raw) => Transport::parse(&raw).ok_or(ConfigError::Invalid {
                name: "MCP_TRANSPORT",
                value: raw,
            })?,
            None => Transport::Stdio,
        };

        let port = match get("FASTMCP_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "FASTMCP_PORT",
                value: raw,
            })?,
            None => 8000,
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECONDS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::Invalid {
                name: "HTTP_TIMEOUT_SECONDS",
                value: raw,
            })?),
            None => Duration::from_secs(60),
        };

        let auth_method = match get("SNOWFLAKE_AUTH_METHOD").map(|v| v.to_ascii_lowercase()) {
            None => AuthMethod::Token,
            Some(v) if v == "token" => AuthMethod::Token,
            Some(v) if v == "private_key" => AuthMethod::PrivateKey,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "SNOWFLAKE_AUTH_METHOD",
                    value: v,
                });
            }
        };

        let key_pair = if auth_method == AuthMethod::PrivateKey {
            Some(KeyPairSettings {
                account: get("SNOWFLAKE_ACCOUNT").ok_or(ConfigError::Missing("SNOWFLAKE_ACCOUNT"))?,
                username: get("SNOWFLAKE_USERNAME").ok_or(ConfigError::Missing("SNOWFLAKE_USERNAME"))?,
                private_key_path: get("SNOWFLAKE_PRIVATE_KEY_PATH")
                    .ok_or(ConfigError::Missing("SNOWFLAKE_PRIVATE_KEY_PATH"))?,
                public_key_fingerprint: get("SNOWFLAKE_PUBLIC_KEY_FINGERPRINT")
                    .ok_or(ConfigError::Missing("SNOWFLAKE_PUBLIC_KEY_FINGERPRINT"))?,
                private_key_passphrase: get("SNOWFLAKE_PRIVATE_KEY_PASSPHRASE"),
            })
        } else {
            None
        };

        let internal_gateway = get("INTERNAL_GATEWAY")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Settings {
            transport,
            host: get("FASTMCP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            base_url: get("SNOWFLAKE_BASE_URL")
                .ok_or(ConfigError::Missing("SNOWFLAKE_BASE_URL"))?
                .trim_end_matches('/')
                .to_string(),
            database: get("SNOWFLAKE_DATABASE"),
            schema: get("SNOWFLAKE_SCHEMA"),
            warehouse: get("SNOWFLAKE_WAREHOUSE").unwrap_or_else(|| "DEFAULT".to_string()),
            internal_gateway,
            auth_method,
            // Callers supply their own token unless this process owns the credential.
            token: if transport == Transport::Stdio || internal_gateway {
                get("SNOWFLAKE_TOKEN")
            } else {
                None
            },
            key_pair,
            http_timeout,
        })
    }

    /// Whether the credential comes from this process rather than the caller.
    pub fn uses_local_credential(&self) -> bool {
        self.transport == Transport::Stdio || self.internal_gateway
    }
}
