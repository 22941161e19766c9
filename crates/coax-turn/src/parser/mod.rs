//! Model response parsing and target resolution.

mod resolver;
mod response;

pub use resolver::{fuzzy_match, resolve_coordinates, resolve_target};
pub use response::{extract_json, parse_response};
