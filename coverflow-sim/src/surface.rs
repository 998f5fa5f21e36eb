use coverflow_core::prelude::*;

/// Surface that only counts what it is asked to do.
#[derive(Debug, Default)]
pub struct TallySurface {
    pub frames: u64,
    pub quads: u64,
    pub placeholders: u64,
    pub released: u64,
    pub released_bytes: usize,
    pub frame_requests: u64,
}

impl RenderSurface for TallySurface {
    fn draw_quad(&mut self, _quad: &ProjectedQuad, image: Option<&ImageHandle>, _opacity: f32) {
        self.quads += 1;
        if image.is_none() {
            self.placeholders += 1;
        }
    }

    fn request_next_frame(&mut self) {
        self.frame_requests += 1;
    }

    fn release_image(&mut self, image: &ImageHandle) {
        self.released += 1;
        self.released_bytes += image.byte_size();
    }
}
