//! Domain models for Podmeta.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider tags and per-provider settings
//! - [`status`] - Provider health reported back to callers
//! - [`marketplace`] - Target storefronts and their constraint tables
//! - [`metadata`] - Raw and normalized metadata
//! - [`image`] - Inline image payloads
//! - [`route`] - Provider/model fallback plan and request targets

mod image;
mod marketplace;
mod metadata;
mod provider;
mod route;
mod status;

pub use image::{ImageMime, ImagePayload};
pub use marketplace::{MarketConstraints, Marketplace};
pub use metadata::{ApiResponse, NormalizedMetadata};
pub use provider::{ProviderConfigSet, ProviderKind, ProviderSettings};
pub use route::{ModelDescriptor, ProviderRoute, RequestTarget};
pub use status::{ProviderStatus, StatusUpdate};
