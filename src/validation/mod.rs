//! Stateless input validators.
//!
//! Every check fails closed: anything that does not clearly match the
//! accepted shape is rejected.

mod format;
mod network;
mod path;
mod sanitize;

pub use format::{is_valid_code_format, is_valid_username};
pub use network::is_valid_url;
pub use path::is_valid_file_path;
pub use sanitize::{sanitize_html, sanitize_input, MAX_INPUT_LENGTH};
