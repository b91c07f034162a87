//! Daily token record persistence

pub mod json_store;

pub use json_store::{day_file_name, JsonFileStore, DEFAULT_OUTPUT_DIR};
