pub mod fill;
pub mod sanitize;
