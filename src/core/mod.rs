// Public modules
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod executor;
pub mod files;
pub mod logger;
pub mod pipeline;
pub mod stages;
pub mod template;

// Re-export common types for convenience
pub use error::{Error, Result};
