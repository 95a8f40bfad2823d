//! SSH client config model
//!
//! Handles:
//! - Host entries and whole documents
//! - Parsing and writing the OpenSSH `config` text format
//! - Locating and persisting `~/.ssh/config`

pub mod codec;
mod document;
mod storage;

pub use document::{ConfigDocument, HostEntry, CURRENT_VERSION, DEFAULT_PORT};
pub use storage::{
    ensure_private_dir, load_local, save_local, write_private_file, SshPaths,
};
