//! ssh-config-sync - share SSH host entries through an object-storage bucket
//!
//! This crate provides:
//! - A round-trip parser/writer for the OpenSSH `config` file
//! - `get`/`put` reconciliation of named hosts between `~/.ssh/config`
//!   and a JSON document stored in the bucket
//! - Transfer of the identity files those hosts reference

pub mod cli;
pub mod config;
pub mod error;
pub mod oss;
pub mod sync;

pub use error::{Result, SshSyncError};
