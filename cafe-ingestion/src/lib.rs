pub mod actions;
pub mod config;
pub mod console;
pub mod error;
pub mod services;

#[cfg(test)]
mod test_support;

pub use error::{IngestError, Result};
