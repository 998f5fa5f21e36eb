//! Host-facing seams: what the carousel draws into, where its items come
//! from and who hears about selections and reorders.

use super::projection::ProjectedQuad;
use crate::domains::images::{ImageHandle, ImageKey, PayloadFuture};

/// Rasterizer owned by the host. Called from the render loop only.
pub trait RenderSurface {
    /// Draw one tile. `None` means the shared placeholder.
    fn draw_quad(&mut self, quad: &ProjectedQuad, image: Option<&ImageHandle>, opacity: f32);

    /// Ask for another frame; the render loop is still animating.
    fn request_next_frame(&mut self);

    /// The image left the cache; free any GPU-side copy.
    fn release_image(&mut self, image: &ImageHandle);
}

/// Ordered item collection the carousel mirrors.
pub trait ItemSource {
    type Key: ImageKey;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Image identity of the item at `index`, if it has one.
    fn image_key(&self, index: usize) -> Option<Self::Key>;

    /// Raw payload of the item's image. Not polled until a load slot is
    /// free.
    fn payload(&self, index: usize) -> Option<PayloadFuture>;

    /// Move the item at `from` so it ends up at `to`. The source may report
    /// the change back through `on_items_changed`; the controller ignores
    /// that echo.
    fn move_item(&mut self, from: usize, to: usize);
}

/// Structural change notification from the item source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Inserted { index: usize, count: usize },
    Removed { index: usize, count: usize },
    Moved { from: usize, to: usize },
    Reset,
}

/// Hears about committed drag-to-reorder moves.
pub trait ReorderSink {
    fn reordered(&mut self, from: usize, to: usize);
}

impl<F: FnMut(usize, usize)> ReorderSink for F {
    fn reordered(&mut self, from: usize, to: usize) {
        self(from, to)
    }
}

/// Hears about tap-to-select and settle-after-pan selections.
pub trait SelectionSink {
    fn selected(&mut self, index: usize);
}

impl<F: FnMut(usize)> SelectionSink for F {
    fn selected(&mut self, index: usize) {
        self(index)
    }
}
