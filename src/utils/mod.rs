//! Utility modules supporting the MCP surface.
//!
//! - [`validate`]: argument and identifier validation used by tools,
//!   resources and prompts before anything reaches an outbound URL.

pub mod validate;

pub use validate::{
    one_of, optional_string, require_number, require_string, safe_identifier, ValidationError,
};
