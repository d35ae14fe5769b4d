// ABOUTME: Cryptographic primitives for protecting tenant secrets at rest
// ABOUTME: Houses the vault implementing AEAD encryption with per-secret derived keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

/// AEAD vault with per-secret key derivation and hex wire format
pub mod vault;

pub use vault::{EncryptedSecret, SecretVault};
