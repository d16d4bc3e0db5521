// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Podmeta Core
//!
//! Core types, models, and traits for Podmeta.
//!
//! This crate provides the foundational abstractions used across all other
//! Podmeta crates, including:
//!
//! - Domain models (providers, marketplaces, metadata, images, routes)
//! - The metadata normalizer
//! - Prompt templates
//! - The rotating credential pool
//! - Error types and the status-reporter trait
//!
//! Nothing in this crate performs I/O.
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - Supported vision providers
//! - [`ProviderSettings`] / [`ProviderConfigSet`] - Per-call configuration snapshot
//! - [`ProviderStatus`] / [`StatusUpdate`] - Advisory health telemetry
//! - [`ProviderRoute`] / [`RequestTarget`] - Fallback plan and attempt target
//!
//! ### Metadata Types
//! - [`Marketplace`] / [`MarketConstraints`] - Storefronts and their limits
//! - [`ApiResponse`] - Raw model output
//! - [`NormalizedMetadata`] - Marketplace-compliant output of [`normalize()`]

pub mod credentials;
pub mod error;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Provider types
    ProviderConfigSet,
    ProviderKind,
    ProviderSettings,
    ProviderStatus,
    StatusUpdate,
    // Routing
    ModelDescriptor,
    ProviderRoute,
    RequestTarget,
    // Metadata
    ApiResponse,
    ImageMime,
    ImagePayload,
    MarketConstraints,
    Marketplace,
    NormalizedMetadata,
};

pub use credentials::{CredentialPool, mask_key};
pub use normalize::normalize;
pub use traits::{NoopReporter, StatusReporter};
