// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Podmeta Fetch
//!
//! HTTP plumbing and the provider fallback pipeline for Podmeta.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing, timeout and bearer auth
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! ## Request Pipeline
//!
//! - [`backend::VisionBackend`] - One request, one classified outcome
//! - [`retry::RetryStrategy`] - Exponential backoff with jitter
//! - [`pipeline::VisionPipeline`] - Provider/model fallback with status reporting
//! - [`context::FetchContext`] - HTTP client, retry policy and cancellation
//!
//! ## Example
//!
//! ```ignore
//! use podmeta_fetch::{FetchContext, VisionPipeline};
//!
//! let ctx = FetchContext::new();
//! let pipeline = VisionPipeline::new(backend, routes).with_pool(pool);
//!
//! let generated = pipeline
//!     .generate_metadata(&ctx, &image, Marketplace::TeePublic, &config, &NoopReporter)
//!     .await?;
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod retry;

// Errors
pub use error::{ErrorKind, FetchError, HttpError, KeychainError};

// Host APIs
pub use host::{
    http::{HttpClient, ResponseExt},
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain},
};

// Pipeline
pub use backend::VisionBackend;
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use pipeline::{AnalysisAttempt, AnalysisOutcome, GeneratedMetadata, VisionPipeline};
pub use retry::{RetryOutcome, RetryStrategy};

// Cancellation token used by `FetchContext`
pub use tokio_util::sync::CancellationToken;
