//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod dependencies;
pub mod diagnostics;
pub mod driver;
pub mod environment;
pub mod install;
pub mod launcher;
pub mod layout;
pub mod ledger;
pub mod package;
pub mod probe;
pub mod requirements;
pub mod rollback;
pub mod sequencer;
