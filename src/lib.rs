pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `gantry::pipeline` instead of `gantry::core::pipeline`
pub use core::*;
