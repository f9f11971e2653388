//! Output projections for reconstructed documents.

mod json;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use options::FlattenOptions;
pub use text::to_text;
