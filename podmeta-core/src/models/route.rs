//! Provider and model routing types.
//!
//! A [`ProviderRoute`] is one entry of the ordered fallback plan: a provider
//! with its candidate models in descending capability order. A
//! [`RequestTarget`] is the concrete (provider, model, credential) chosen for
//! a single attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::ProviderKind;
use crate::credentials::mask_key;

/// A model offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier sent in the request body.
    pub id: String,
    /// Short human label.
    pub label: String,
}

impl ModelDescriptor {
    /// Creates a model descriptor.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// One provider in the fallback plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRoute {
    /// Provider tag.
    pub provider: ProviderKind,
    /// API base URL, e.g. `https://api.mistral.ai/v1`.
    pub base_url: String,
    /// Candidate models, best first.
    pub models: Vec<ModelDescriptor>,
}

impl ProviderRoute {
    /// Creates a route with no models.
    pub fn new(provider: ProviderKind, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
            models: Vec::new(),
        }
    }

    /// Appends a candidate model.
    pub fn with_model(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.models.push(ModelDescriptor::new(id, label));
        self
    }
}

/// The provider, model and credential selected for one attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Provider tag.
    pub provider: ProviderKind,
    /// Model identifier.
    pub model: String,
    /// API key.
    pub credential: String,
    /// API base URL.
    pub base_url: String,
}

impl fmt::Debug for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTarget")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("credential", &mask_key(&self.credential))
            .field("base_url", &self.base_url)
            .finish()
    }
}
