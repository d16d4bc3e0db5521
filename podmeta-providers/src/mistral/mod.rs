//! Mistral provider.
//!
//! Pixtral and Mistral Medium accept images through the OpenAI-compatible
//! chat-completions endpoint at `https://api.mistral.ai/v1`.

mod descriptor;

pub use descriptor::{MISTRAL_BASE_URL, mistral_descriptor};
