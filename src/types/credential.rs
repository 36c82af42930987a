use derive_more::Display;
use std::{fmt, str::FromStr};
use web3::{
    signing::{Key, SecretKey, SecretKeyRef},
    types::Address,
};

/// Private key used to authorize resolver writes.
///
/// The key is supplied by the caller; this crate neither stores nor rotates it.
#[derive(Clone)]
pub struct Credential {
    key: SecretKey,
}

/// Key material could not be turned into a credential.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum CredentialError {
    /// not valid hex
    #[display(fmt = "Invalid hex: {}", _0)]
    InvalidHex(hex::FromHexError),
    /// not a valid secp256k1 secret
    #[display(fmt = "Invalid secret key: {}", _0)]
    InvalidKey(String),
}

impl std::error::Error for CredentialError {}

impl Credential {
    /// Wraps an existing secret key.
    pub fn new(key: SecretKey) -> Self {
        Credential { key }
    }

    /// Parses a 32-byte hex secret, with or without a `0x` prefix.
    pub fn from_hex(secret: &str) -> Result<Self, CredentialError> {
        let secret = secret.trim();
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = hex::decode(secret).map_err(CredentialError::InvalidHex)?;
        let key = SecretKey::from_slice(&bytes).map_err(|err| CredentialError::InvalidKey(err.to_string()))?;
        Ok(Credential { key })
    }

    /// Address derived from the public key.
    pub fn address(&self) -> Address {
        self.signer().address()
    }

    /// Signing view over the secret key.
    pub fn signer(&self) -> SecretKeyRef<'_> {
        SecretKeyRef::new(&self.key)
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Credential::from_hex(s)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credential").field("address", &self.address()).finish()
    }
}
