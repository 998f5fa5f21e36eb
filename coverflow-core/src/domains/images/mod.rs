//! Decoded tile images, the decoder seam and the bounded image cache.

pub mod cache;
pub mod decoder;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use cache::{CacheEvent, CacheStats, EntryStatus, ImageCache, PayloadFuture};
pub use decoder::{ImageDecoder, RasterDecoder};

/// Identity of an item's image. Anything hashable and cheap to clone.
pub trait ImageKey: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static {}

impl<T> ImageKey for T where T: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static {}

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Decoded RGBA8 pixels.
pub struct RasterImage {
    id: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl RasterImage {
    /// Wrap decoded pixels in a shared handle.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> ImageHandle {
        ImageHandle(Arc::new(RasterImage {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            pixels,
        }))
    }

    /// Single-color image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ImageHandle {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self::new(width, height, pixels)
    }
}

/// Reference-counted handle to a decoded image. Equality is identity.
#[derive(Debug, Clone)]
pub struct ImageHandle(Arc<RasterImage>);

impl ImageHandle {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.0.pixels
    }

    pub fn byte_size(&self) -> usize {
        self.0.pixels.len()
    }

    /// Live clones of this handle, the cache's own included.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ImageHandle {}
