// ABOUTME: Helper modules shared by the integration test binaries
// ABOUTME: Pulled into each test file with a mod declaration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors
#![allow(dead_code)]

pub mod axum_test;
