//! Integration tests for seed-install
//!
//! These spawn the real binary against a temporary home directory.
