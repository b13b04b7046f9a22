//! Unit tests for the SEED installer
//!
//! These tests drive the application services through a scripted host and
//! a temporary home directory. No real package manager, interpreter or
//! network is touched.

mod classifier;
mod diagnostics_service;
mod helpers;
mod prober;
mod rollback_service;
mod sequencer;
