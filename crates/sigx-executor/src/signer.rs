//! Request signing for the REST and private stream channels.
//!
//! Prehash = `path || METHOD || timestamp || nonce || body`.
//! Signature = base64(hex(HMAC-SHA256(secret, prehash))).
//!
//! Stream login signs the fixed verification path with `GET` and no body.

use crate::error::{ExecutorError, ExecutorResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sigx_ws::LoginArgs;
use std::fmt;
use uuid::Uuid;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Path signed for stream authentication.
pub const LOGIN_VERIFY_PATH: &str = "/users/self/verify";

// =============================================================================
// Credentials
// =============================================================================

/// Where to read each credential from.
///
/// Only environment variables are supported; the names are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSource {
    pub api_key_env: String,
    pub secret_env: String,
    pub passphrase_env: String,
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self {
            api_key_env: "BLOFIN_API_KEY".to_string(),
            secret_env: "BLOFIN_API_SECRET".to_string(),
            passphrase_env: "BLOFIN_API_PASSPHRASE".to_string(),
        }
    }
}

/// API key, secret and passphrase. Loaded once, never mutated.
///
/// Never log the secret or passphrase; `Debug` redacts both.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret: Zeroizing<String>,
    passphrase: Zeroizing<String>,
}

impl ApiCredentials {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: Zeroizing::new(secret.into()),
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }

    /// Read all three values from the environment.
    ///
    /// # Errors
    /// `MissingCredential` naming the first variable that is unset.
    pub fn from_env(source: &CredentialSource) -> ExecutorResult<Self> {
        fn read(var_name: &str) -> ExecutorResult<String> {
            std::env::var(var_name)
                .map(|v| v.trim().to_string())
                .map_err(|_| ExecutorError::MissingCredential(var_name.to_string()))
        }

        Ok(Self::new(
            read(&source.api_key_env)?,
            read(&source.secret_env)?,
            read(&source.passphrase_env)?,
        ))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Signer
// =============================================================================

/// Computes request signatures from one set of credentials.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
}

impl RequestSigner {
    /// # Errors
    /// `MissingCredential` when the secret is empty. Not retryable.
    pub fn new(credentials: ApiCredentials) -> ExecutorResult<Self> {
        if credentials.secret.trim().is_empty() {
            return Err(ExecutorError::MissingCredential(
                "API secret is empty".to_string(),
            ));
        }
        Ok(Self { credentials })
    }

    pub fn credentials(&self) -> &ApiCredentials {
        &self.credentials
    }

    /// Sign one REST request. `method` is upper-cased before hashing.
    pub fn sign(
        &self,
        path: &str,
        method: &str,
        timestamp: &str,
        nonce: &str,
        body: &str,
    ) -> ExecutorResult<String> {
        let prehash = format!(
            "{path}{}{timestamp}{nonce}{body}",
            method.to_ascii_uppercase()
        );
        self.digest(&prehash)
    }

    /// Sign a stream login for `timestamp` and `nonce`.
    pub fn sign_login(&self, timestamp: &str, nonce: &str) -> ExecutorResult<String> {
        self.sign(LOGIN_VERIFY_PATH, "GET", timestamp, nonce, "")
    }

    /// Build the login frame arguments with a fresh random nonce.
    pub fn login_args(&self, timestamp_ms: u64) -> ExecutorResult<LoginArgs> {
        let timestamp = timestamp_ms.to_string();
        let nonce = Uuid::new_v4().to_string();
        let sign = self.sign_login(&timestamp, &nonce)?;
        Ok(LoginArgs {
            api_key: self.credentials.api_key.clone(),
            passphrase: self.credentials.passphrase.to_string(),
            timestamp,
            sign,
            nonce,
        })
    }

    fn digest(&self, prehash: &str) -> ExecutorResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret.as_bytes())
            .map_err(|e| ExecutorError::Signing(format!("HMAC init failed: {e}")))?;
        mac.update(prehash.as_bytes());
        let hex_digest = Zeroizing::new(hex::encode(mac.finalize().into_bytes()));
        Ok(BASE64.encode(hex_digest.as_bytes()))
    }
}
