mod json_errors;

pub use json_errors::*;
