// ABOUTME: AEAD vault encrypting tenant secrets with AES-256-GCM and Argon2id-derived keys
// ABOUTME: Serializes to the salt:iv:tag:ciphertext lowercase hex wire format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

//! # Secret Vault
//!
//! Every secret is encrypted under its own 256-bit key, derived from the
//! operator master passphrase and a fresh random salt via Argon2id. The
//! serialized form is four colon-joined lowercase hex fields:
//!
//! ```text
//! <salt: 32 hex>:<iv: 24 hex>:<tag: 32 hex>:<ciphertext: even-length hex>
//! ```
//!
//! Key derivation is deliberately slow and memory-hard, so all cipher work
//! runs on the blocking thread pool and never stalls the async executor.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::task;
use zeroize::Zeroizing;

use crate::config::environment::MasterKey;
use crate::errors::{AppError, AppResult};

/// Salt length in bytes (32 hex characters on the wire)
pub const SALT_LEN: usize = 16;
/// Nonce length in bytes (the wire format's `iv` field, 24 hex characters)
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes (32 hex characters on the wire)
pub const TAG_LEN: usize = 16;
/// Derived key length in bytes
const KEY_LEN: usize = 32;
/// Number of colon-separated fields in the wire format
const FIELD_COUNT: usize = 4;

/// Parsed wire form of a vault-encrypted secret
#[derive(Debug)]
pub struct EncryptedSecret {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedSecret {
    /// Parse a serialized secret, enforcing field count and component lengths
    ///
    /// This is a pure format check; no key material is touched and no
    /// decryption is attempted.
    ///
    /// # Errors
    ///
    /// Returns an invalid-ciphertext error if the field count is wrong, any
    /// field is not valid hex, or a decoded component has the wrong length.
    pub fn parse(serialized: &str) -> AppResult<Self> {
        let fields: Vec<&str> = serialized.split(':').collect();
        if fields.len() != FIELD_COUNT {
            return Err(AppError::invalid_ciphertext(format!(
                "Serialized secret must have {FIELD_COUNT} colon-separated fields, found {}",
                fields.len()
            )));
        }

        let salt = decode_fixed::<SALT_LEN>(fields[0], "salt")?;
        let nonce = decode_fixed::<NONCE_LEN>(fields[1], "iv")?;
        let tag = decode_fixed::<TAG_LEN>(fields[2], "tag")?;
        let ciphertext = hex::decode(fields[3])
            .map_err(|e| AppError::invalid_ciphertext(format!("Invalid ciphertext hex: {e}")))?;

        Ok(Self {
            salt,
            nonce,
            tag,
            ciphertext,
        })
    }

    /// Serialize to the colon-joined lowercase hex wire format
    #[must_use]
    pub fn serialize(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            hex::encode(self.salt),
            hex::encode(self.nonce),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }

    /// Whether `value` matches the wire format
    #[must_use]
    pub fn matches_format(value: &str) -> bool {
        Self::parse(value).is_ok()
    }
}

fn decode_fixed<const N: usize>(field: &str, name: &str) -> AppResult<[u8; N]> {
    let bytes = hex::decode(field)
        .map_err(|e| AppError::invalid_ciphertext(format!("Invalid {name} hex: {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        AppError::invalid_ciphertext(format!(
            "Invalid {name} length: expected {N} bytes, found {len}"
        ))
    })
}

/// Vault encrypting and decrypting tenant secrets
///
/// Holds the validated master passphrase when one is configured. An
/// unconfigured vault rejects every encrypt/decrypt call with a
/// configuration error; format checks still work.
pub struct SecretVault {
    master_key: Option<MasterKey>,
}

impl SecretVault {
    /// Create a vault from an optional validated master key
    #[must_use]
    pub const fn new(master_key: Option<MasterKey>) -> Self {
        Self { master_key }
    }

    /// Whether a master key is configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.master_key.is_some()
    }

    /// Whether `value` is in the vault wire format
    ///
    /// Pure format check; never attempts decryption. Plaintext legacy keys
    /// and malformed colon strings return false.
    #[must_use]
    pub fn is_encrypted(value: &str) -> bool {
        EncryptedSecret::matches_format(value)
    }

    fn require_key(&self) -> AppResult<&MasterKey> {
        self.master_key
            .as_ref()
            .ok_or_else(|| AppError::config("Master encryption key is not configured"))
    }

    /// Encrypt a plaintext secret
    ///
    /// Generates a fresh salt and nonce, derives the per-secret key via
    /// Argon2id on the blocking pool, and returns the serialized wire form.
    /// Two calls with identical plaintext never produce the same output.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No master key is configured
    /// - Key derivation or encryption fails
    pub async fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let key = self.require_key()?.clone();
        let plaintext = plaintext.to_owned();

        task::spawn_blocking(move || encrypt_blocking(&key, &plaintext))
            .await
            .map_err(|e| AppError::internal(format!("Encryption task failed: {e}")))?
    }

    /// Decrypt a serialized secret back to plaintext
    ///
    /// Parses and validates the wire format, re-derives the key from the
    /// embedded salt, and opens the ciphertext. Any single-bit change to any
    /// field fails the authentication tag check.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No master key is configured
    /// - The wire format is malformed
    /// - The authentication tag rejects the payload
    pub async fn decrypt(&self, serialized: &str) -> AppResult<String> {
        let key = self.require_key()?.clone();
        let secret = EncryptedSecret::parse(serialized)?;

        task::spawn_blocking(move || decrypt_blocking(&key, &secret))
            .await
            .map_err(|e| AppError::internal(format!("Decryption task failed: {e}")))?
    }

    /// Encrypt a primary secret and an optional secondary secret concurrently
    ///
    /// # Errors
    ///
    /// Returns the first error from either encryption.
    pub async fn encrypt_credential_pair(
        &self,
        primary: &str,
        secondary: Option<&str>,
    ) -> AppResult<(String, Option<String>)> {
        let secondary_fut = async {
            match secondary {
                Some(value) => self.encrypt(value).await.map(Some),
                None => Ok(None),
            }
        };
        tokio::try_join!(self.encrypt(primary), secondary_fut)
    }

    /// Decrypt a primary secret and an optional secondary secret concurrently
    ///
    /// # Errors
    ///
    /// Returns the first error from either decryption.
    pub async fn decrypt_credential_pair(
        &self,
        primary: &str,
        secondary: Option<&str>,
    ) -> AppResult<(String, Option<String>)> {
        let secondary_fut = async {
            match secondary {
                Some(value) => self.decrypt(value).await.map(Some),
                None => Ok(None),
            }
        };
        tokio::try_join!(self.decrypt(primary), secondary_fut)
    }
}

fn derive_key(master: &MasterKey, salt: &[u8]) -> AppResult<Zeroizing<[u8; KEY_LEN]>> {
    let mut derived = Zeroizing::new([0u8; KEY_LEN]);
    Argon2::default()
        .hash_password_into(master.bytes(), salt, &mut *derived)
        .map_err(|e| AppError::internal(format!("Key derivation failed: {e}")))?;
    Ok(derived)
}

fn encrypt_blocking(key: &MasterKey, plaintext: &str) -> AppResult<String> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let derived = derive_key(key, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(derived.as_slice())
        .map_err(|e| AppError::internal(format!("Failed to initialize cipher: {e}")))?;

    let combined = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| AppError::internal("Encryption failed"))?;

    if combined.len() < TAG_LEN {
        return Err(AppError::internal("Cipher output shorter than tag"));
    }
    let (ciphertext, tag_bytes) = combined.split_at(combined.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(tag_bytes);

    let secret = EncryptedSecret {
        salt,
        nonce,
        tag,
        ciphertext: ciphertext.to_vec(),
    };
    Ok(secret.serialize())
}

fn decrypt_blocking(key: &MasterKey, secret: &EncryptedSecret) -> AppResult<String> {
    let derived = derive_key(key, &secret.salt)?;
    let cipher = Aes256Gcm::new_from_slice(derived.as_slice())
        .map_err(|e| AppError::internal(format!("Failed to initialize cipher: {e}")))?;

    let mut combined = Vec::with_capacity(secret.ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(&secret.ciphertext);
    combined.extend_from_slice(&secret.tag);

    let plaintext_bytes = cipher
        .decrypt(Nonce::from_slice(&secret.nonce), combined.as_slice())
        .map_err(|_| {
            AppError::decryption_failed("Decryption failed: authentication tag rejected payload")
        })?;

    String::from_utf8(plaintext_bytes)
        .map_err(|_| AppError::decryption_failed("Decrypted payload is not valid UTF-8"))
}
