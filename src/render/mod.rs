//! Rendering of reconstructed documents.

mod json;
mod text;

pub use json::{merged_to_json, records_to_json, to_json, write_json, JsonFormat};
pub use text::to_text;
