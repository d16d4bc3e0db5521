//! Groq provider.
//!
//! Llama vision models served through Groq's OpenAI-compatible endpoint.

mod descriptor;

pub use descriptor::{GROQ_BASE_URL, groq_descriptor};
