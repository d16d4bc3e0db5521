//! Output formatting for CLI.

mod json;
mod text;

pub use json::{JsonFormatter, KeysOutput, ValidationOutput};
pub use text::TextFormatter;
