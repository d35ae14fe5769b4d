// ABOUTME: Integration tests for the secret vault encryption and wire format
// ABOUTME: Covers round-trips, non-determinism, tamper rejection, and format checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use vaultguard::crypto::vault::{EncryptedSecret, SecretVault};
use vaultguard::errors::ErrorCode;
use vaultguard::test_utils::test_master_key;

fn test_vault() -> SecretVault {
    common::init_test_logging();
    SecretVault::new(Some(test_master_key().unwrap()))
}

fn unconfigured_vault() -> SecretVault {
    common::init_test_logging();
    SecretVault::new(None)
}

/// Replace one hex character of `field`, keeping it valid hex
fn flip_hex_char(field: &str, index: usize) -> String {
    let mut chars: Vec<char> = field.chars().collect();
    chars[index] = if chars[index] == '0' { '1' } else { '0' };
    chars.into_iter().collect()
}

// ============================================================================
// Round-Trip Tests
// ============================================================================

#[tokio::test]
async fn test_round_trip_preserves_plaintext() {
    let vault = test_vault();

    let encrypted = vault.encrypt("sk_live_abc123").await.unwrap();
    let decrypted = vault.decrypt(&encrypted).await.unwrap();

    assert_eq!(decrypted, "sk_live_abc123");
    assert_ne!(encrypted, "sk_live_abc123");
}

#[tokio::test]
async fn test_round_trip_empty_string() {
    let vault = test_vault();

    let encrypted = vault.encrypt("").await.unwrap();
    assert!(SecretVault::is_encrypted(&encrypted));

    let decrypted = vault.decrypt(&encrypted).await.unwrap();
    assert_eq!(decrypted, "");
}

#[tokio::test]
async fn test_round_trip_long_secret() {
    let vault = test_vault();
    let plaintext = "sk_live_".to_owned() + &"a1b2c3d4".repeat(1024);

    let encrypted = vault.encrypt(&plaintext).await.unwrap();
    let decrypted = vault.decrypt(&encrypted).await.unwrap();

    assert_eq!(decrypted, plaintext);
}

#[tokio::test]
async fn test_round_trip_unicode_secret() {
    let vault = test_vault();
    let plaintext = "clé-secrète-日本語-🔐-ñandú";

    let encrypted = vault.encrypt(plaintext).await.unwrap();
    let decrypted = vault.decrypt(&encrypted).await.unwrap();

    assert_eq!(decrypted, plaintext);
}

#[tokio::test]
async fn test_credential_pair_round_trip() {
    let vault = test_vault();

    let (primary, secondary) = vault
        .encrypt_credential_pair("sk_live_abc123", Some("proj_42"))
        .await
        .unwrap();
    let secondary = secondary.unwrap();
    assert!(SecretVault::is_encrypted(&primary));
    assert!(SecretVault::is_encrypted(&secondary));

    let (api_key, project_id) = vault
        .decrypt_credential_pair(&primary, Some(&secondary))
        .await
        .unwrap();
    assert_eq!(api_key, "sk_live_abc123");
    assert_eq!(project_id.as_deref(), Some("proj_42"));
}

#[tokio::test]
async fn test_credential_pair_without_secondary() {
    let vault = test_vault();

    let (primary, secondary) = vault
        .encrypt_credential_pair("sk_live_abc123", None)
        .await
        .unwrap();
    assert!(secondary.is_none());

    let (api_key, project_id) = vault.decrypt_credential_pair(&primary, None).await.unwrap();
    assert_eq!(api_key, "sk_live_abc123");
    assert!(project_id.is_none());
}

// ============================================================================
// Non-Determinism
// ============================================================================

#[tokio::test]
async fn test_encrypting_twice_never_repeats_output() {
    let vault = test_vault();

    let first = vault.encrypt("same-secret").await.unwrap();
    let second = vault.encrypt("same-secret").await.unwrap();

    assert_ne!(first, second);

    // Fresh randomness per call: the salt and iv fields must both differ
    let first_fields: Vec<&str> = first.split(':').collect();
    let second_fields: Vec<&str> = second.split(':').collect();
    assert_ne!(first_fields[0], second_fields[0]);
    assert_ne!(first_fields[1], second_fields[1]);

    // Both still decrypt to the original
    assert_eq!(vault.decrypt(&first).await.unwrap(), "same-secret");
    assert_eq!(vault.decrypt(&second).await.unwrap(), "same-secret");
}

// ============================================================================
// Tamper Rejection
// ============================================================================

#[tokio::test]
async fn test_tampering_any_field_fails_decryption() {
    let vault = test_vault();
    let encrypted = vault.encrypt("tamper-check-secret").await.unwrap();
    let fields: Vec<&str> = encrypted.split(':').collect();
    assert_eq!(fields.len(), 4);

    for tampered_index in 0..4 {
        let mut tampered_fields: Vec<String> =
            fields.iter().map(|f| (*f).to_owned()).collect();
        tampered_fields[tampered_index] = flip_hex_char(&tampered_fields[tampered_index], 3);
        let tampered = tampered_fields.join(":");
        assert_ne!(tampered, encrypted);

        let err = vault.decrypt(&tampered).await.unwrap_err();
        assert_eq!(
            err.code,
            ErrorCode::DecryptionFailed,
            "tampering field {tampered_index} must fail the tag check"
        );
    }
}

// ============================================================================
// Wire Format Validation
// ============================================================================

#[tokio::test]
async fn test_decrypt_rejects_wrong_field_count() {
    let vault = test_vault();

    for malformed in ["", "deadbeef", "aa:bb:cc", "aa:bb:cc:dd:ee"] {
        let err = vault.decrypt(malformed).await.unwrap_err();
        assert_eq!(
            err.code,
            ErrorCode::InvalidCiphertext,
            "{malformed:?} must be rejected as malformed"
        );
    }
}

#[tokio::test]
async fn test_decrypt_rejects_wrong_component_lengths() {
    let vault = test_vault();
    let encrypted = vault.encrypt("length-check").await.unwrap();
    let fields: Vec<&str> = encrypted.split(':').collect();

    // Drop two hex characters (one byte) from each fixed-length component
    for short_index in 0..3 {
        let mut shortened: Vec<String> = fields.iter().map(|f| (*f).to_owned()).collect();
        let shortened_len = shortened[short_index].len() - 2;
        shortened[short_index].truncate(shortened_len);
        let malformed = shortened.join(":");

        let err = vault.decrypt(&malformed).await.unwrap_err();
        assert_eq!(
            err.code,
            ErrorCode::InvalidCiphertext,
            "short field {short_index} must be rejected before any decryption"
        );
    }
}

#[tokio::test]
async fn test_decrypt_rejects_non_hex_fields() {
    let vault = test_vault();
    let encrypted = vault.encrypt("hex-check").await.unwrap();
    let fields: Vec<&str> = encrypted.split(':').collect();

    let malformed = format!(
        "{}:{}:{}:{}",
        "zz".repeat(16),
        fields[1],
        fields[2],
        fields[3]
    );
    let err = vault.decrypt(&malformed).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidCiphertext);
}

#[tokio::test]
async fn test_is_encrypted_detects_wire_format() {
    let vault = test_vault();

    let encrypted = vault.encrypt("sk_live_abc123").await.unwrap();
    assert!(SecretVault::is_encrypted(&encrypted));

    assert!(!SecretVault::is_encrypted("sk_live_abc123"));
    assert!(!SecretVault::is_encrypted(""));
    assert!(!SecretVault::is_encrypted("legacy_key_987"));
    assert!(!SecretVault::is_encrypted("aa:bb:cc:dd"));
    assert!(!SecretVault::is_encrypted("not:enough:fields"));

    // Colon-shaped but with a truncated salt field
    let fields: Vec<&str> = encrypted.split(':').collect();
    let short_salt = format!("{}:{}:{}:{}", &fields[0][..30], fields[1], fields[2], fields[3]);
    assert!(!SecretVault::is_encrypted(&short_salt));
}

#[tokio::test]
async fn test_format_check_accepts_empty_ciphertext_field() {
    let vault = test_vault();

    // Encrypting an empty string produces an empty ciphertext component
    let encrypted = vault.encrypt("").await.unwrap();
    let fields: Vec<&str> = encrypted.split(':').collect();
    assert_eq!(fields[3], "");
    assert!(EncryptedSecret::matches_format(&encrypted));
}

#[test]
fn test_parse_serialize_round_trip() {
    common::init_test_logging();
    let serialized = format!(
        "{}:{}:{}:{}",
        "ab".repeat(16),
        "cd".repeat(12),
        "ef".repeat(16),
        "0123456789abcdef"
    );

    let parsed = EncryptedSecret::parse(&serialized).unwrap();
    assert_eq!(parsed.serialize(), serialized);
}

// ============================================================================
// Unconfigured Vault
// ============================================================================

#[tokio::test]
async fn test_unconfigured_vault_rejects_operations() {
    let vault = unconfigured_vault();
    assert!(!vault.is_configured());

    let err = vault.encrypt("sk_live_abc123").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);

    // Decryption is refused before the payload is even parsed
    let err = vault.decrypt("not-even-wire-format").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);

    // Format checks need no key material
    assert!(!SecretVault::is_encrypted("sk_live_abc123"));
}

#[tokio::test]
async fn test_configured_vault_reports_configured() {
    let vault = test_vault();
    assert!(vault.is_configured());
}
