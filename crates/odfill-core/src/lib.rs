// Core modules
pub mod data;
pub mod error;
pub mod markup;
pub mod media;
pub mod package;
pub mod remote;
pub mod sanitize;
pub mod template;
pub mod units;

// Re-export commonly used types
pub use error::{OdfillError, Result};
