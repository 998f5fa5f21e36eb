use super::animator::SpringConfig;
use super::drag::DragVisual;
use super::types::{LayoutParams, Size};
use crate::domains::images::ImageHandle;

/// Everything the interaction side tells the render loop. Values only; the
/// render loop never reads controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    SetTarget(f64),
    /// Jump without animating (detach, reset).
    SnapTo(f64),
    SetLayout(LayoutParams),
    SetViewport(Size),
    SetSpring(SpringConfig),
    /// Lower bound on the drawn radius; the viewport may widen it.
    SetMinWindowRadius(usize),
    ImageReady { index: usize, handle: ImageHandle },
    ImageCleared { index: usize },
    /// Release a handle the cache evicted.
    Dispose(ImageHandle),
    ItemsMoved { from: usize, to: usize },
    ItemsInserted { index: usize, count: usize },
    ItemsRemoved { index: usize, count: usize },
    ItemsReset { count: usize },
    DragVisual(Option<DragVisual>),
    Detach,
}
