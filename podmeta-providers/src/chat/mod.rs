//! OpenAI-compatible chat-completions support shared by every provider.
//!
//! - [`wire`] - Request and response bodies
//! - [`parser`] - Response and error envelope parsing
//! - [`backend`] - The [`VisionBackend`](podmeta_fetch::VisionBackend) implementation

pub mod backend;
pub mod parser;
pub mod wire;

pub use backend::ChatCompletionsBackend;
pub use parser::{error_message, parse_chat_response, strip_code_fence};
pub use wire::ChatRequest;
