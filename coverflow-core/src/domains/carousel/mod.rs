//! Interaction-side carousel state: focus animation, geometry, hit-testing,
//! virtualization and drag-to-reorder, tied together by the controller.

pub mod animator;
pub mod controller;
pub mod drag;
pub mod host;
pub mod messages;
pub mod projection;
pub mod slots;
pub mod types;
pub mod window;

pub use controller::{CarouselController, ControllerOptions, PointerResult};
pub use host::{ItemChange, ItemSource, RenderSurface, ReorderSink, SelectionSink};
pub use messages::RenderCommand;
pub use types::{LayoutParams, Point, Size, VisibleRange};
