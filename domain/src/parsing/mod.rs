//! Extraction of JSON payloads from free-form model output.
//!
//! Providers are free to wrap the JSON they were asked for in prose or code
//! fences. These helpers recover the object without trusting the format.

pub mod json;

pub use json::{extract_json_object, field_as_string, field_as_string_list};
