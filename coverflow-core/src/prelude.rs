//! Curated surface for hosts embedding the carousel.

pub use crate::domains::carousel::animator::{EasingFunction, SpringAnimator, SpringConfig};
pub use crate::domains::carousel::controller::{
    CarouselController, ControllerOptions, PointerResult,
};
pub use crate::domains::carousel::drag::{DragConfig, DragState, DragVisual};
pub use crate::domains::carousel::host::{
    ItemChange, ItemSource, RenderSurface, ReorderSink, SelectionSink,
};
pub use crate::domains::carousel::messages::RenderCommand;
pub use crate::domains::carousel::projection::{ProjectedQuad, project, project_at};
pub use crate::domains::carousel::types::{LayoutParams, Point, Size, VisibleRange};
pub use crate::domains::images::{
    CacheEvent, CacheStats, EntryStatus, ImageCache, ImageDecoder, ImageHandle, ImageKey,
    PayloadFuture, RasterDecoder, RasterImage,
};
pub use crate::domains::render::{FrameStats, RenderLoop};
pub use crate::error::{CarouselError, ImageError};
pub use crate::infra::{ManualScheduler, RuntimeConfig, Scheduler, TimerKind, TokioScheduler};
