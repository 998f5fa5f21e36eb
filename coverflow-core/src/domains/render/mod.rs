//! Render context: turns commands into draw calls.

pub mod render_loop;

pub use render_loop::{FrameStats, RenderLoop};
