// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Podmeta Store
//!
//! Persistent state for Podmeta.
//!
//! This crate provides:
//!
//! - **SettingsStore**: User preferences with persistence
//! - **KeyPoolStore**: The per-provider API key pool file
//! - **CredentialStore**: Key resolution (environment > keychain > pool)
//! - **StatusBoard**: Live provider status, used as the pipeline's reporter
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use podmeta_store::{CredentialStore, KeyPoolStore, SettingsStore, StatusBoard};
//!
//! let settings = SettingsStore::load_default().await?;
//! let pool = KeyPoolStore::default_location().load().await;
//!
//! let mut config = settings.get().await.provider_config();
//! CredentialStore::new().resolve_into(&mut config, &pool).await;
//!
//! let board = StatusBoard::new();
//! // ... run the pipeline with `&board` as reporter ...
//! settings.apply_status_updates(&board.snapshot()).await;
//! settings.save().await?;
//! ```

pub mod credentials;
pub mod error;
pub mod key_pool;
pub mod persistence;
pub mod settings_store;
pub mod status_board;

pub use credentials::{CredentialStore, KeySource, ResolvedKey};
pub use error::StoreError;
pub use key_pool::KeyPoolStore;
pub use persistence::{
    default_config_dir, default_key_pool_path, default_settings_path, ensure_dir, load_json,
    load_json_or_default, save_json,
};
pub use settings_store::{LogLevel, Settings, SettingsStore};
pub use status_board::StatusBoard;
