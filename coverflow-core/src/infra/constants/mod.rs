//! Constants module for centralized configuration values

pub mod carousel;

// Re-export commonly used items
pub use carousel::{drag, hit_test, motion, projection, render, virtualization};
